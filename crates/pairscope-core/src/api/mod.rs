//! Price-source API clients.
//!
//! Every source implements [`PriceSource`]. The snapshot tool chains them in a
//! fixed fallback order; the clients themselves never retry.

pub mod binance;
pub mod bybit;
pub mod cryptocompare;

pub use binance::BinanceClient;
pub use bybit::BybitClient;
pub use cryptocompare::CryptoCompareClient;

use crate::types::DailyClose;
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use serde::de::DeserializeOwned;
use std::time::Duration as StdDuration;
use tracing::debug;

/// A source of daily closes and spot prices.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Short label used in logs and reports.
    fn name(&self) -> &'static str;

    /// Up to `limit` daily closes for `asset`, oldest first.
    ///
    /// The last element is the current, still-forming day.
    async fn daily_closes(&self, asset: &str, limit: usize) -> Result<Vec<DailyClose>>;

    /// Latest traded price for `asset`.
    async fn current_price(&self, asset: &str) -> Result<f64>;
}

/// Build the shared HTTP client used by all sources.
pub fn build_http_client() -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(StdDuration::from_secs(30))
        .connect_timeout(StdDuration::from_secs(10))
        .user_agent(concat!("pairscope/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// GET `url` and decode the JSON body, mapping non-2xx responses to [`Error::Api`].
pub(crate) async fn get_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
    source: &str,
) -> Result<T> {
    let response = request.send().await?;
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let preview: String = body.chars().take(200).collect();
        debug!(source, status = %status, body = %preview, "Price source returned error");
        return Err(Error::Api {
            message: format!("{} request failed: {}", source, status),
            status: Some(status.as_u16()),
        });
    }

    Ok(response.json().await?)
}

/// Convert a millisecond epoch timestamp to a UTC calendar date.
pub(crate) fn date_from_millis(ms: i64) -> Result<NaiveDate> {
    DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.date_naive())
        .ok_or_else(|| Error::api(format!("invalid timestamp {}", ms)))
}

/// Parse a price that may arrive as a JSON string or number.
pub(crate) fn parse_price(value: &serde_json::Value) -> Result<f64> {
    let price = match value {
        serde_json::Value::String(s) => s.parse::<f64>().ok(),
        serde_json::Value::Number(n) => n.as_f64(),
        _ => None,
    };
    match price {
        Some(p) if p.is_finite() && p > 0.0 => Ok(p),
        _ => Err(Error::api(format!("invalid price value {}", value))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_price_accepts_string_and_number() {
        assert_eq!(parse_price(&json!("42.5")).unwrap(), 42.5);
        assert_eq!(parse_price(&json!(17)).unwrap(), 17.0);
    }

    #[test]
    fn test_parse_price_rejects_non_positive() {
        assert!(parse_price(&json!("0")).is_err());
        assert!(parse_price(&json!(null)).is_err());
        assert!(parse_price(&json!("abc")).is_err());
    }

    #[test]
    fn test_date_from_millis() {
        let date = date_from_millis(1_767_225_600_000).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
    }
}
