use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Cents, UserId};

pub type CashTransactionId = Uuid;

/// Signup grant credited to every new account as an ordinary deposit row:
/// $10,000.00 in cents.
pub const SIGNUP_BONUS_CENTS: Cents = 1_000_000;

/// One external cash movement. Append-only; the sign of `amount_cents` is
/// the sole discriminator between deposits and withdrawals. Trades do not
/// appear here - they move value between cash and holdings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashTransaction {
    pub id: CashTransactionId,
    pub user_id: UserId,
    /// Signed cents delta: positive for a deposit (signup grant included),
    /// negative for a withdrawal.
    pub amount_cents: Cents,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CashKind {
    Deposit,
    Withdrawal,
}

impl CashKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CashKind::Deposit => "Deposit",
            CashKind::Withdrawal => "Withdrawal",
        }
    }
}

impl std::fmt::Display for CashKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl CashTransaction {
    pub fn new(user_id: UserId, amount_cents: Cents, occurred_at: DateTime<Utc>) -> Self {
        assert!(amount_cents != 0, "Cash transaction amount must be non-zero");
        Self {
            id: Uuid::new_v4(),
            user_id,
            amount_cents,
            occurred_at,
        }
    }

    pub fn kind(&self) -> CashKind {
        if self.amount_cents > 0 {
            CashKind::Deposit
        } else {
            CashKind::Withdrawal
        }
    }
}
