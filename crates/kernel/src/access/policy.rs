//! Content visibility policy.
//!
//! Pure decision functions over an [`Actor`], a content record's owner and
//! [`PrivacyLevel`], and the follow predicate. The persistence layer calls
//! these before (or alongside) a fetch; no query syntax lives here.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::access::Actor;

/// Visibility level of an owned content record.
///
/// Stored in the database and on the wire as `"public"`, `"friends"`, or
/// `"private"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrivacyLevel {
    /// Readable by everyone, including anonymous visitors.
    Public,
    /// Readable by the owner and by users who follow the owner.
    #[serde(rename = "friends")]
    FriendsOnly,
    /// Readable by the owner only.
    Private,
}

impl PrivacyLevel {
    /// The wire/database representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            PrivacyLevel::Public => "public",
            PrivacyLevel::FriendsOnly => "friends",
            PrivacyLevel::Private => "private",
        }
    }

    /// Parse a stored value, treating anything unrecognized as [`Private`].
    ///
    /// Unknown levels deny non-owner access rather than granting it.
    ///
    /// [`Private`]: PrivacyLevel::Private
    pub fn from_stored(value: &str) -> Self {
        value.parse().unwrap_or(PrivacyLevel::Private)
    }
}

impl fmt::Display for PrivacyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrivacyLevel {
    type Err = UnknownPrivacyLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(PrivacyLevel::Public),
            "friends" => Ok(PrivacyLevel::FriendsOnly),
            "private" => Ok(PrivacyLevel::Private),
            other => Err(UnknownPrivacyLevel(other.to_string())),
        }
    }
}

/// Error for an unrecognized privacy level string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown privacy level '{0}'")]
pub struct UnknownPrivacyLevel(pub String);

/// The view of a content record the policy evaluates.
///
/// Topics, blog posts, and stored files implement this; the policy never
/// sees the rest of the record.
pub trait OwnedContent {
    /// The owning user, or `None` when the stored owner is absent or
    /// unparseable. A missing owner denies all access (fail closed).
    fn owner_id(&self) -> Option<Uuid>;

    /// The record's visibility level.
    fn privacy_level(&self) -> PrivacyLevel;

    /// Whether the record is an unpublished draft. Drafts are visible to
    /// the owner only, regardless of privacy level. Only blog posts
    /// override this.
    fn is_draft(&self) -> bool {
        false
    }
}

/// Decide whether `actor` may read `item`.
///
/// `is_following(viewer, owner)` is the friend predicate; callers prefetch
/// the follow edge from the persistence layer and pass a pure closure.
///
/// Friends-only content requires an actual follow edge. An authenticated
/// viewer with no edge is denied.
pub fn can_read<C, F>(item: &C, actor: &Actor, is_following: F) -> bool
where
    C: OwnedContent + ?Sized,
    F: Fn(Uuid, Uuid) -> bool,
{
    let Some(owner_id) = item.owner_id() else {
        // No owner on record: deny everyone.
        return false;
    };

    if actor.is_user(owner_id) {
        return true;
    }

    if item.is_draft() {
        return false;
    }

    match item.privacy_level() {
        PrivacyLevel::Public => true,
        PrivacyLevel::FriendsOnly => match actor.user_id() {
            Some(viewer) => is_following(viewer, owner_id),
            None => false,
        },
        PrivacyLevel::Private => false,
    }
}

/// Decide whether `actor` may mutate `item`. Owner only; there are no
/// moderator or administrator exceptions.
pub fn can_mutate<C>(item: &C, actor: &Actor) -> bool
where
    C: OwnedContent + ?Sized,
{
    match item.owner_id() {
        Some(owner_id) => actor.is_user(owner_id),
        None => false,
    }
}

/// Decide whether `actor` may move `item` to `_new_level`.
///
/// Owners may move content between all three levels freely; the target
/// level places no additional restriction.
pub fn can_change_privacy<C>(item: &C, actor: &Actor, _new_level: PrivacyLevel) -> bool
where
    C: OwnedContent + ?Sized,
{
    can_mutate(item, actor)
}
