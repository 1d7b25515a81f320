use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tracing::debug;

use crate::domain::{cents_from_price, normalize_ticker};

use super::{Quote, QuoteProvider};

/// Client-side request timeout. A quote that takes longer than this is
/// treated the same as an unknown symbol.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

const USER_AGENT: &str = concat!("papertrade/", env!("CARGO_PKG_VERSION"));

/// Quote client backed by the Yahoo Finance v8 chart endpoint.
///
/// One unauthenticated GET per lookup; the latest adjusted close over the
/// past week is taken as the current price.
pub struct YahooQuoteClient {
    http: reqwest::Client,
}

impl YahooQuoteClient {
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { http })
    }
}

#[async_trait]
impl QuoteProvider for YahooQuoteClient {
    async fn lookup(&self, ticker: &str) -> Option<Quote> {
        let ticker = normalize_ticker(ticker);
        if ticker.is_empty() || !is_safe_ticker(&ticker) {
            return None;
        }

        let end = Utc::now();
        let start = end - chrono::Duration::days(7);
        let url = format!(
            "https://query2.finance.yahoo.com/v8/finance/chart/{}?period1={}&period2={}&interval=1d&events=history&includeAdjustedClose=true",
            ticker,
            start.timestamp(),
            end.timestamp()
        );

        let response = match self.http.get(&url).send().await {
            Ok(response) => response,
            Err(err) => {
                debug!(%ticker, %err, "quote request failed");
                return None;
            }
        };

        let body: Value = match response.error_for_status().ok()?.json().await {
            Ok(body) => body,
            Err(err) => {
                debug!(%ticker, %err, "quote response was not valid JSON");
                return None;
            }
        };

        let price = extract_chart_price(&body)?;
        let price_cents = cents_from_price(price)?;
        Some(Quote { ticker, price_cents })
    }
}

/// Tickers go into the URL path; reject anything that could not be a
/// plain symbol rather than escaping it.
fn is_safe_ticker(ticker: &str) -> bool {
    ticker
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='))
}

/// Pull the latest adjusted close out of a v8 chart payload.
fn extract_chart_price(body: &Value) -> Option<f64> {
    body.pointer("/chart/result/0/indicators/adjclose/0/adjclose")?
        .as_array()?
        .iter()
        .rev()
        .find_map(Value::as_f64)
}
