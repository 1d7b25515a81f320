use serde::{Deserialize, Serialize};

use crate::domain::{CashActivity, Cents, TradeActivity};

/// One priced position in a portfolio report. `price_cents` is `None`
/// when the quote source had no answer for a held symbol; such positions
/// are listed but excluded from the totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub ticker: String,
    pub shares: i64,
    pub price_cents: Option<Cents>,
    pub worth_cents: Option<Cents>,
}

/// Point-in-time valuation of an account: cash plus every positive
/// holding at its current quote. Quotes for different holdings may
/// reflect slightly different instants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioReport {
    pub username: String,
    pub cash_cents: Cents,
    pub positions: Vec<Position>,
    pub holdings_worth_cents: Cents,
    pub total_worth_cents: Cents,
    /// Total worth minus every external cash movement (signup grant
    /// included) - what the account has gained through trading.
    pub gain_cents: Cents,
}

/// Trade and cash history for an account, both newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryReport {
    pub trades: Vec<TradeActivity>,
    pub cash: Vec<CashActivity>,
}
