use std::collections::HashMap;

use parking_lot::RwLock;
use uuid::Uuid;

use crate::domain::UserId;

use super::AppError;

pub type SessionToken = Uuid;

/// In-memory map of opaque session tokens to user IDs.
///
/// Every authenticated operation resolves its token through `require`
/// before touching the ledger; an unknown token is rejected with
/// `AuthRequired` and nothing is read or written.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<SessionToken, UserId>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Establish a session for a freshly authenticated user.
    pub fn create(&self, user_id: UserId) -> SessionToken {
        let token = Uuid::new_v4();
        self.sessions.write().insert(token, user_id);
        token
    }

    /// Resolve a token to its user, rejecting unknown tokens.
    pub fn require(&self, token: SessionToken) -> Result<UserId, AppError> {
        self.sessions
            .read()
            .get(&token)
            .copied()
            .ok_or(AppError::AuthRequired)
    }

    /// Drop a session. Unknown tokens are ignored.
    pub fn clear(&self, token: SessionToken) {
        self.sessions.write().remove(&token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_require() {
        let store = SessionStore::new();
        let user_id = Uuid::new_v4();
        let token = store.create(user_id);
        assert_eq!(store.require(token).unwrap(), user_id);
    }

    #[test]
    fn test_unknown_token_rejected() {
        let store = SessionStore::new();
        assert!(matches!(
            store.require(Uuid::new_v4()),
            Err(AppError::AuthRequired)
        ));
    }

    #[test]
    fn test_clear_invalidates() {
        let store = SessionStore::new();
        let token = store.create(Uuid::new_v4());
        store.clear(token);
        assert!(matches!(store.require(token), Err(AppError::AuthRequired)));
    }
}
