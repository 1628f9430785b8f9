//! Integration tests for the visibility policy against the real content
//! types (topics, blog posts, stored files, profiles).

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::HashSet;

use chrono::Utc;
use piazza_kernel::access::{
    Actor, OwnedContent, PrivacyLevel, can_change_privacy, can_mutate, can_read,
};
use piazza_kernel::file::StoredFile;
use piazza_kernel::models::{BlogPost, Topic, User};
use serde_json::json;
use uuid::Uuid;

/// In-memory follow graph standing in for the persistence layer.
struct FollowGraph {
    edges: HashSet<(Uuid, Uuid)>,
}

impl FollowGraph {
    fn new() -> Self {
        Self {
            edges: HashSet::new(),
        }
    }

    fn follow(&mut self, follower: Uuid, following: Uuid) {
        self.edges.insert((follower, following));
    }

    fn predicate(&self) -> impl Fn(Uuid, Uuid) -> bool + '_ {
        |viewer, owner| self.edges.contains(&(viewer, owner))
    }
}

fn topic(author_id: Uuid, privacy: PrivacyLevel) -> Topic {
    Topic {
        id: Uuid::now_v7(),
        category_id: Uuid::now_v7(),
        author_id,
        title: "A topic".to_string(),
        body: "Body".to_string(),
        privacy_level: privacy,
        created: 0,
        changed: 0,
    }
}

fn blog_post(author_id: Uuid, privacy: PrivacyLevel, published: bool) -> BlogPost {
    BlogPost {
        id: Uuid::now_v7(),
        author_id,
        title: "A post".to_string(),
        slug: "a-post".to_string(),
        content: json!([{ "id": "b1", "type": "paragraph", "content": "text" }]),
        privacy_level: privacy,
        published,
        created: 0,
        changed: 0,
    }
}

fn stored_file(owner_id: Uuid, privacy: PrivacyLevel) -> StoredFile {
    StoredFile {
        id: Uuid::now_v7(),
        owner_id,
        filename: "doc.pdf".to_string(),
        uri: "local://2026/08/abcd1234_doc.pdf".to_string(),
        mime: "application/pdf".to_string(),
        size: 1024,
        privacy_level: privacy,
        created: 0,
        changed: 0,
    }
}

// ============================================================================
// Read policy across entity types
// ============================================================================

#[test]
fn public_items_visible_to_anonymous() {
    let owner = Uuid::now_v7();
    let follows = FollowGraph::new();

    assert!(can_read(
        &topic(owner, PrivacyLevel::Public),
        &Actor::Anonymous,
        follows.predicate()
    ));
    assert!(can_read(
        &blog_post(owner, PrivacyLevel::Public, true),
        &Actor::Anonymous,
        follows.predicate()
    ));
    assert!(can_read(
        &stored_file(owner, PrivacyLevel::Public),
        &Actor::Anonymous,
        follows.predicate()
    ));
}

#[test]
fn private_items_are_owner_only_across_types() {
    let owner = Uuid::now_v7();
    let stranger = Uuid::now_v7();
    let mut follows = FollowGraph::new();
    // Even a follower is not enough for private content.
    follows.follow(stranger, owner);

    let items: Vec<Box<dyn OwnedContent>> = vec![
        Box::new(topic(owner, PrivacyLevel::Private)),
        Box::new(blog_post(owner, PrivacyLevel::Private, true)),
        Box::new(stored_file(owner, PrivacyLevel::Private)),
    ];

    for item in &items {
        assert!(can_read(
            item.as_ref(),
            &Actor::Authenticated(owner),
            follows.predicate()
        ));
        assert!(!can_read(
            item.as_ref(),
            &Actor::Authenticated(stranger),
            follows.predicate()
        ));
        assert!(!can_read(
            item.as_ref(),
            &Actor::Anonymous,
            follows.predicate()
        ));
    }
}

#[test]
fn friends_only_follows_the_follow_graph() {
    let owner = Uuid::now_v7();
    let friend = Uuid::now_v7();
    let stranger = Uuid::now_v7();

    let mut follows = FollowGraph::new();
    follows.follow(friend, owner);

    let item = topic(owner, PrivacyLevel::FriendsOnly);

    assert!(can_read(
        &item,
        &Actor::Authenticated(friend),
        follows.predicate()
    ));
    // Logged in but not following: denied.
    assert!(!can_read(
        &item,
        &Actor::Authenticated(stranger),
        follows.predicate()
    ));
    assert!(!can_read(&item, &Actor::Anonymous, follows.predicate()));
}

#[test]
fn follow_direction_matters() {
    let owner = Uuid::now_v7();
    let viewer = Uuid::now_v7();

    // The owner follows the viewer, not the other way round.
    let mut follows = FollowGraph::new();
    follows.follow(owner, viewer);

    let item = blog_post(owner, PrivacyLevel::FriendsOnly, true);

    assert!(!can_read(
        &item,
        &Actor::Authenticated(viewer),
        follows.predicate()
    ));
}

#[test]
fn drafts_trump_privacy_level() {
    let owner = Uuid::now_v7();
    let friend = Uuid::now_v7();
    let mut follows = FollowGraph::new();
    follows.follow(friend, owner);

    for privacy in [
        PrivacyLevel::Public,
        PrivacyLevel::FriendsOnly,
        PrivacyLevel::Private,
    ] {
        let draft = blog_post(owner, privacy, false);

        assert!(can_read(
            &draft,
            &Actor::Authenticated(owner),
            follows.predicate()
        ));
        assert!(!can_read(
            &draft,
            &Actor::Authenticated(friend),
            follows.predicate()
        ));
        assert!(!can_read(&draft, &Actor::Anonymous, follows.predicate()));
    }
}

#[test]
fn profile_visibility_uses_the_same_policy() {
    let user = User {
        id: Uuid::now_v7(),
        name: "carol".to_string(),
        pass: String::new(),
        mail: "carol@example.com".to_string(),
        bio: Some("hi".to_string()),
        privacy_level: PrivacyLevel::FriendsOnly,
        blog_default_privacy: PrivacyLevel::Public,
        file_default_privacy: PrivacyLevel::Private,
        status: 1,
        created: Utc::now(),
    };

    let friend = Uuid::now_v7();
    let mut follows = FollowGraph::new();
    follows.follow(friend, user.id);

    assert!(can_read(
        &user,
        &Actor::Authenticated(friend),
        follows.predicate()
    ));
    assert!(!can_read(
        &user,
        &Actor::Authenticated(Uuid::now_v7()),
        follows.predicate()
    ));
}

// ============================================================================
// Mutation policy
// ============================================================================

#[test]
fn mutation_is_owner_only_everywhere() {
    let owner = Uuid::now_v7();
    let stranger = Uuid::now_v7();

    let items: Vec<Box<dyn OwnedContent>> = vec![
        Box::new(topic(owner, PrivacyLevel::Public)),
        Box::new(blog_post(owner, PrivacyLevel::Public, true)),
        Box::new(stored_file(owner, PrivacyLevel::Public)),
    ];

    for item in &items {
        assert!(can_mutate(item.as_ref(), &Actor::Authenticated(owner)));
        assert!(!can_mutate(item.as_ref(), &Actor::Authenticated(stranger)));
        assert!(!can_mutate(item.as_ref(), &Actor::Anonymous));
    }
}

#[test]
fn privacy_transitions_are_unrestricted_for_owners() {
    let owner = Uuid::now_v7();
    let item = stored_file(owner, PrivacyLevel::Private);

    for target in [
        PrivacyLevel::Public,
        PrivacyLevel::FriendsOnly,
        PrivacyLevel::Private,
    ] {
        assert!(can_change_privacy(
            &item,
            &Actor::Authenticated(owner),
            target
        ));
        assert!(!can_change_privacy(
            &item,
            &Actor::Authenticated(Uuid::now_v7()),
            target
        ));
    }
}

// ============================================================================
// End-to-end scenarios
// ============================================================================

#[test]
fn scenario_private_topic() {
    let u1 = Uuid::now_v7();
    let u2 = Uuid::now_v7();
    let item = topic(u1, PrivacyLevel::Private);

    // Any follow function at all: the answer must not depend on it.
    assert!(!can_read(&item, &Actor::Authenticated(u2), |_, _| true));
    assert!(can_read(&item, &Actor::Authenticated(u1), |_, _| false));
}

#[test]
fn scenario_public_draft_hidden_from_anonymous() {
    let post = blog_post(Uuid::now_v7(), PrivacyLevel::Public, false);
    assert!(!can_read(&post, &Actor::Anonymous, |_, _| false));
}
