//! Shared route helpers.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use tower_sessions::Session;
use uuid::Uuid;

use crate::access::{Actor, OwnedContent, can_read};
use crate::error::{AppError, AppResult};
use crate::models::Follow;
use crate::routes::auth::SESSION_USER_ID;
use crate::state::AppState;

/// Resolve the current actor from session state.
///
/// A missing or unreadable session yields [`Actor::Anonymous`].
pub async fn current_actor(session: &Session) -> Actor {
    let user_id: Option<Uuid> = session.get(SESSION_USER_ID).await.ok().flatten();
    match user_id {
        Some(id) => Actor::Authenticated(id),
        None => Actor::Anonymous,
    }
}

/// Require an authenticated user, returning the user ID.
pub async fn require_user(session: &Session) -> Result<Uuid, AppError> {
    current_actor(session)
        .await
        .user_id()
        .ok_or(AppError::Unauthorized)
}

/// Pagination query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct Pagination {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Pagination {
    /// Resolve to a (limit, offset) pair. Page size is clamped to 1..=100.
    pub fn limit_offset(&self) -> (i64, i64) {
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        let page = self.page.unwrap_or(1).max(1);
        (per_page, (page - 1) * per_page)
    }
}

/// Evaluate the read policy for one item, prefetching the follow edge the
/// friends-only check needs.
pub async fn actor_can_read<C>(state: &AppState, actor: &Actor, item: &C) -> AppResult<bool>
where
    C: OwnedContent,
{
    let followed = match (actor.user_id(), item.owner_id()) {
        (Some(viewer), Some(owner)) if viewer != owner => {
            Follow::exists(state.db(), viewer, owner).await?
        }
        _ => false,
    };

    Ok(can_read(item, actor, |_, _| followed))
}

/// Filter a listing down to the items `actor` may read.
///
/// Follow edges are fetched once per distinct owner.
pub async fn filter_readable<C>(
    state: &AppState,
    actor: &Actor,
    items: Vec<C>,
) -> AppResult<Vec<C>>
where
    C: OwnedContent,
{
    let mut follow_cache: HashMap<Uuid, bool> = HashMap::new();
    let mut visible = Vec::with_capacity(items.len());

    for item in items {
        let followed = match (actor.user_id(), item.owner_id()) {
            (Some(viewer), Some(owner)) if viewer != owner => match follow_cache.get(&owner) {
                Some(cached) => *cached,
                None => {
                    let followed = Follow::exists(state.db(), viewer, owner).await?;
                    follow_cache.insert(owner, followed);
                    followed
                }
            },
            _ => false,
        };

        if can_read(&item, actor, |_, _| followed) {
            visible.push(item);
        }
    }

    Ok(visible)
}

/// Escape text for safe inclusion in HTML attribute or element context.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Valid usernames: 3-32 chars of letters, digits, underscore, dash.
///
/// # Panics
///
/// Panics if the hard-coded regex literal is invalid (impossible in practice).
#[allow(clippy::expect_used)]
static VALID_USERNAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]{3,32}$").expect("valid regex literal"));

/// Check whether a username is acceptable.
pub fn is_valid_username(name: &str) -> bool {
    VALID_USERNAME.is_match(name)
}

/// Runs of characters that cannot appear in a slug.
///
/// # Panics
///
/// Panics if the hard-coded regex literal is invalid (impossible in practice).
#[allow(clippy::expect_used)]
static SLUG_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("valid regex literal"));

/// Turn a title into a URL slug: lowercase, alphanumeric runs joined by
/// single dashes, trimmed, capped at 80 chars.
pub fn slugify(input: &str) -> String {
    let lowered = input.to_lowercase();
    let slug = SLUG_SEPARATORS.replace_all(&lowered, "-");
    slug.trim_matches('-').chars().take(80).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn html_escape_special_chars() {
        assert_eq!(html_escape("<>&\"'"), "&lt;&gt;&amp;&quot;&#x27;");
    }

    #[test]
    fn username_validation() {
        assert!(is_valid_username("alice"));
        assert!(is_valid_username("a_b-c3"));
        assert!(!is_valid_username("ab"));
        assert!(!is_valid_username("has space"));
        assert!(!is_valid_username("émile"));
        assert!(!is_valid_username(&"x".repeat(33)));
    }

    #[test]
    fn slugify_titles() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("  Rust & Forums  "), "rust-forums");
        assert_eq!(slugify("already-a-slug"), "already-a-slug");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn pagination_defaults_and_clamps() {
        let p = Pagination::default();
        assert_eq!(p.limit_offset(), (20, 0));

        let p = Pagination {
            page: Some(3),
            per_page: Some(10),
        };
        assert_eq!(p.limit_offset(), (10, 20));

        let p = Pagination {
            page: Some(0),
            per_page: Some(1000),
        };
        assert_eq!(p.limit_offset(), (100, 0));
    }
}
