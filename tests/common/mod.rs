// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use papertrade::application::{BrokerageService, PasswordHasher};
use papertrade::domain::{normalize_ticker, Cents, UserId};
use papertrade::quotes::{Quote, QuoteProvider};
use parking_lot::RwLock;
use tempfile::TempDir;

/// Quote source with a mutable fixed price table.
pub struct FixedQuotes {
    prices: RwLock<HashMap<String, Cents>>,
}

impl FixedQuotes {
    pub fn new(prices: &[(&str, Cents)]) -> Self {
        Self {
            prices: RwLock::new(
                prices
                    .iter()
                    .map(|(ticker, cents)| (normalize_ticker(ticker), *cents))
                    .collect(),
            ),
        }
    }

    /// Set or change the price for a ticker mid-test.
    pub fn set(&self, ticker: &str, price_cents: Cents) {
        self.prices
            .write()
            .insert(normalize_ticker(ticker), price_cents);
    }

    /// Make a ticker unknown to the quote source.
    pub fn remove(&self, ticker: &str) {
        self.prices.write().remove(&normalize_ticker(ticker));
    }
}

#[async_trait]
impl QuoteProvider for FixedQuotes {
    async fn lookup(&self, ticker: &str) -> Option<Quote> {
        let ticker = normalize_ticker(ticker);
        let price_cents = *self.prices.read().get(&ticker)?;
        Some(Quote { ticker, price_cents })
    }
}

/// Hasher that stores passwords behind a marker prefix; fast and
/// deterministic, for tests only.
pub struct PlainHasher;

impl PasswordHasher for PlainHasher {
    fn hash(&self, password: &str) -> Result<String> {
        Ok(format!("plain:{password}"))
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        hash == format!("plain:{password}")
    }
}

/// Create a test service backed by a temporary database and a fixed
/// quote table (AAPL $150, NFLX $400, MSFT $310.50).
pub async fn test_service() -> Result<(BrokerageService, Arc<FixedQuotes>, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let quotes = Arc::new(FixedQuotes::new(&[
        ("AAPL", 15_000),
        ("NFLX", 40_000),
        ("MSFT", 31_050),
    ]));
    let service = BrokerageService::init(
        db_path.to_str().unwrap(),
        quotes.clone(),
        Box::new(PlainHasher),
    )
    .await?;
    Ok((service, quotes, temp_dir))
}

/// Register a user with a standard password and return its ID.
pub async fn register_user(service: &BrokerageService, username: &str) -> Result<UserId> {
    let (user, _token) = service.register(username, "pw", "pw").await?;
    Ok(user.id)
}
