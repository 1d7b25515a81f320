use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type SymbolId = Uuid;

/// A traded ticker. Created lazily on the first purchase of a previously
/// unseen symbol; immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Symbol {
    pub id: SymbolId,
    /// Uppercase-normalized ticker string, unique across all symbols.
    pub ticker: String,
    pub created_at: DateTime<Utc>,
}

impl Symbol {
    pub fn new(ticker: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            ticker: ticker.into(),
            created_at: Utc::now(),
        }
    }
}

/// Trim and uppercase a user-supplied ticker.
pub fn normalize_ticker(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}
