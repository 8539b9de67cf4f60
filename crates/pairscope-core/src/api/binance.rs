//! Binance spot REST client (primary source).

use super::{date_from_millis, get_json, parse_price, PriceSource};
use crate::types::DailyClose;
use crate::{Error, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

/// Binance public market-data client.
pub struct BinanceClient {
    base_url: String,
    quote: String,
    http_client: reqwest::Client,
}

impl BinanceClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.binance.com";
    /// Binance caps kline requests at 1000 candles.
    const MAX_LIMIT: usize = 1000;

    pub fn new(base_url: Option<String>, quote: &str, http_client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.unwrap_or_else(|| Self::DEFAULT_BASE_URL.to_string()),
            quote: quote.to_uppercase(),
            http_client,
        }
    }

    fn symbol(&self, asset: &str) -> String {
        format!("{}{}", asset.to_uppercase(), self.quote)
    }
}

#[derive(Debug, Deserialize)]
struct TickerPrice {
    price: serde_json::Value,
}

/// Parse the `/api/v3/klines` array-of-arrays payload.
///
/// Row layout: `[open_time_ms, open, high, low, close, volume, close_time, ...]`.
pub fn parse_klines(rows: &[Vec<serde_json::Value>]) -> Result<Vec<DailyClose>> {
    rows.iter()
        .map(|row| {
            let open_time = row
                .first()
                .and_then(|v| v.as_i64())
                .ok_or_else(|| Error::api("kline row missing open time"))?;
            let close = row
                .get(4)
                .ok_or_else(|| Error::api("kline row missing close"))?;
            Ok(DailyClose {
                date: date_from_millis(open_time)?,
                close: parse_price(close)?,
            })
        })
        .collect()
}

#[async_trait]
impl PriceSource for BinanceClient {
    fn name(&self) -> &'static str {
        "binance"
    }

    async fn daily_closes(&self, asset: &str, limit: usize) -> Result<Vec<DailyClose>> {
        let symbol = self.symbol(asset);
        let limit = limit.min(Self::MAX_LIMIT).to_string();
        debug!(symbol = %symbol, limit = %limit, "Fetching Binance daily klines");

        let request = self
            .http_client
            .get(format!("{}/api/v3/klines", self.base_url))
            .query(&[
                ("symbol", symbol.as_str()),
                ("interval", "1d"),
                ("limit", limit.as_str()),
            ]);
        let rows: Vec<Vec<serde_json::Value>> = get_json(request, self.name()).await?;
        parse_klines(&rows)
    }

    async fn current_price(&self, asset: &str) -> Result<f64> {
        let symbol = self.symbol(asset);
        let request = self
            .http_client
            .get(format!("{}/api/v3/ticker/price", self.base_url))
            .query(&[("symbol", symbol.as_str())]);
        let ticker: TickerPrice = get_json(request, self.name()).await?;
        parse_price(&ticker.price)
    }
}
