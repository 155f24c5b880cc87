//! Identity of the signed-in user.

use uuid::Uuid;

/// Supplies the identity of the current user.
///
/// Sign-in and token handling live elsewhere; this layer only needs to know
/// who, if anyone, is acting.
pub trait SessionProvider: Send + Sync {
    /// Returns the signed-in user's id, or `None` when signed out.
    fn current_user_id(&self) -> Option<Uuid>;
}

/// A session whose identity never changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StaticSession {
    user_id: Option<Uuid>,
}

impl StaticSession {
    /// Creates a session signed in as `user_id`.
    pub fn signed_in(user_id: Uuid) -> Self {
        Self {
            user_id: Some(user_id),
        }
    }

    /// Creates a signed-out session.
    pub fn anonymous() -> Self {
        Self { user_id: None }
    }
}

impl SessionProvider for StaticSession {
    fn current_user_id(&self) -> Option<Uuid> {
        self.user_id
    }
}
