use serde::{Deserialize, Serialize};

use super::{SymbolId, UserId};

/// Share balance for one (user, symbol) pair.
///
/// Created lazily at zero on first purchase and never deleted; a position
/// sold down to nothing persists as a zero row. The amount always equals
/// the sum of the user's trade deltas for the symbol and never goes
/// negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Holding {
    pub user_id: UserId,
    pub symbol_id: SymbolId,
    /// Denormalized ticker, joined in for display and quote lookups.
    pub ticker: String,
    pub amount: i64,
}
