mod yahoo;

pub use yahoo::*;

use serde::{Deserialize, Serialize};

use crate::domain::Cents;

/// A point-in-time price for a ticker, as returned by the quote source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub ticker: String,
    pub price_cents: Cents,
}

/// External market-data dependency.
///
/// Implementations collapse every network or parse failure to `None`;
/// callers treat `None` as an unknown symbol. No retries, no caching.
#[async_trait::async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn lookup(&self, ticker: &str) -> Option<Quote>;
}
