use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CashKind, Cents, TradeKind};

/// One row of trade history, as shown to the user: newest first, with a
/// 1-based rank assigned over ascending execution time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeActivity {
    pub rank: i64,
    pub ticker: String,
    pub kind: TradeKind,
    /// Unsigned share count.
    pub shares: i64,
    pub price_cents: Cents,
    pub executed_at: DateTime<Utc>,
}

/// One row of cash history: newest first, 1-based rank over ascending
/// time, with the balance of the cash transaction log running up to and
/// including this row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashActivity {
    pub rank: i64,
    pub kind: CashKind,
    /// Unsigned cents amount.
    pub amount_cents: Cents,
    pub running_total_cents: Cents,
    pub occurred_at: DateTime<Utc>,
}

impl TradeActivity {
    /// Signed share delta as stored in the ledger.
    pub fn delta(&self) -> i64 {
        match self.kind {
            TradeKind::Bought => self.shares,
            TradeKind::Sold => -self.shares,
        }
    }
}

impl CashActivity {
    /// Signed cents delta as stored in the ledger.
    pub fn delta_cents(&self) -> Cents {
        match self.kind {
            CashKind::Deposit => self.amount_cents,
            CashKind::Withdrawal => -self.amount_cents,
        }
    }
}
