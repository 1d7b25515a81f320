use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Cents, SymbolId, UserId};

pub type TradeId = Uuid;

/// One executed buy or sell. Trade records are append-only; the sign of
/// `delta` is the sole discriminator between the two kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    pub id: TradeId,
    pub user_id: UserId,
    pub symbol_id: SymbolId,
    /// Signed share delta: positive for a buy, negative for a sell.
    pub delta: i64,
    /// Price per share in cents at execution time.
    pub price_cents: Cents,
    pub executed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeKind {
    Bought,
    Sold,
}

impl TradeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeKind::Bought => "Bought",
            TradeKind::Sold => "Sold",
        }
    }
}

impl std::fmt::Display for TradeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TradeRecord {
    pub fn new(
        user_id: UserId,
        symbol_id: SymbolId,
        delta: i64,
        price_cents: Cents,
        executed_at: DateTime<Utc>,
    ) -> Self {
        assert!(delta != 0, "Trade delta must be non-zero");
        Self {
            id: Uuid::new_v4(),
            user_id,
            symbol_id,
            delta,
            price_cents,
            executed_at,
        }
    }

    pub fn kind(&self) -> TradeKind {
        if self.delta > 0 {
            TradeKind::Bought
        } else {
            TradeKind::Sold
        }
    }

    /// Unsigned share count.
    pub fn shares(&self) -> i64 {
        self.delta.abs()
    }

    /// Cash movement caused by this trade: negative for a buy, positive
    /// for a sell.
    pub fn cash_flow_cents(&self) -> Cents {
        -self.delta * self.price_cents
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_ids() -> (UserId, SymbolId) {
        (Uuid::new_v4(), Uuid::new_v4())
    }

    #[test]
    fn test_buy_kind_from_sign() {
        let (user, symbol) = sample_ids();
        let trade = TradeRecord::new(user, symbol, 10, 15_000, Utc::now());
        assert_eq!(trade.kind(), TradeKind::Bought);
        assert_eq!(trade.shares(), 10);
        assert_eq!(trade.cash_flow_cents(), -150_000);
    }

    #[test]
    fn test_sell_kind_from_sign() {
        let (user, symbol) = sample_ids();
        let trade = TradeRecord::new(user, symbol, -4, 15_000, Utc::now());
        assert_eq!(trade.kind(), TradeKind::Sold);
        assert_eq!(trade.shares(), 4);
        assert_eq!(trade.cash_flow_cents(), 60_000);
    }

    #[test]
    #[should_panic(expected = "Trade delta must be non-zero")]
    fn test_zero_delta_rejected() {
        let (user, symbol) = sample_ids();
        TradeRecord::new(user, symbol, 0, 15_000, Utc::now());
    }
}
