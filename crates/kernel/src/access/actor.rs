//! Request actor identity.

use uuid::Uuid;

/// Identity of the caller a request is evaluated for.
///
/// Derived per request from session state; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    /// No authenticated session.
    Anonymous,
    /// Logged-in user with the given user ID.
    Authenticated(Uuid),
}

impl Actor {
    /// The user ID carried by an authenticated actor.
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Actor::Anonymous => None,
            Actor::Authenticated(id) => Some(*id),
        }
    }

    /// Check if this actor is authenticated.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Actor::Authenticated(_))
    }

    /// Check if this actor is the user identified by `owner_id`.
    pub fn is_user(&self, owner_id: Uuid) -> bool {
        self.user_id() == Some(owner_id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_has_no_user_id() {
        assert_eq!(Actor::Anonymous.user_id(), None);
        assert!(!Actor::Anonymous.is_authenticated());
    }

    #[test]
    fn authenticated_matches_own_id() {
        let id = Uuid::now_v7();
        let actor = Actor::Authenticated(id);
        assert_eq!(actor.user_id(), Some(id));
        assert!(actor.is_authenticated());
        assert!(actor.is_user(id));
        assert!(!actor.is_user(Uuid::now_v7()));
    }
}
