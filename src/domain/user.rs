use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Cents;

pub type UserId = Uuid;

/// A registered account.
///
/// `cash_cents` is a cached running total of the account's cash flow and is
/// updated in the same transaction as every ledger row that affects it.
/// Accounts are never deleted and usernames never change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    /// Opaque credential hash; the hashing scheme lives behind the
    /// `PasswordHasher` seam in the application layer.
    pub password_hash: String,
    pub cash_cents: Cents,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new account with a zero balance. The signup grant is
    /// applied by the registration operation, not here.
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            password_hash: password_hash.into(),
            cash_cents: 0,
            created_at: Utc::now(),
        }
    }
}
