//! Bybit v5 spot REST client (secondary source).

use super::{date_from_millis, get_json, parse_price, PriceSource};
use crate::types::DailyClose;
use crate::{Error, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

/// Bybit public market-data client.
pub struct BybitClient {
    base_url: String,
    quote: String,
    http_client: reqwest::Client,
}

impl BybitClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.bybit.com";
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

/// Bybit v5 response envelope.
#[derive(Debug, Deserialize)]
pub struct BybitResponse<T> {
    #[serde(rename = "retCode")]
    pub ret_code: i64,
    #[serde(rename = "retMsg", default)]
    pub ret_msg: String,
    pub result: Option<T>,
}

impl<T> BybitResponse<T> {
    fn into_result(self) -> Result<T> {
        if self.ret_code != 0 {
            return Err(Error::api(format!(
                "bybit error {}: {}",
                self.ret_code, self.ret_msg
            )));
        }
        self.result
            .ok_or_else(|| Error::api("bybit response missing result"))
    }
}

#[derive(Debug, Deserialize)]
pub struct KlineResult {
    #[serde(default)]
    pub list: Vec<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct TickerResult {
    #[serde(default)]
    list: Vec<Ticker>,
}

#[derive(Debug, Deserialize)]
struct Ticker {
    #[serde(rename = "lastPrice")]
    last_price: serde_json::Value,
}

/// Parse a kline list. Bybit returns newest first; the result is oldest first.
///
/// Row layout: `[start_ms, open, high, low, close, volume, turnover]`, all strings.
pub fn parse_klines(list: &[Vec<String>]) -> Result<Vec<DailyClose>> {
    let mut closes = list
        .iter()
        .map(|row| {
            let start: i64 = row
                .first()
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| Error::api("bybit kline missing start time"))?;
            let close = row
                .get(4)
                .ok_or_else(|| Error::api("bybit kline missing close"))?;
            Ok(DailyClose {
                date: date_from_millis(start)?,
                close: parse_price(&serde_json::Value::String(close.clone()))?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    closes.sort_by_key(|c| c.date);
    Ok(closes)
}

#[async_trait]
impl PriceSource for BybitClient {
    fn name(&self) -> &'static str {
        "bybit"
    }

    async fn daily_closes(&self, asset: &str, limit: usize) -> Result<Vec<DailyClose>> {
        let symbol = self.symbol(asset);
        let limit = limit.min(Self::MAX_LIMIT).to_string();
        debug!(symbol = %symbol, limit = %limit, "Fetching Bybit daily klines");

        let request = self
            .http_client
            .get(format!("{}/v5/market/kline", self.base_url))
            .query(&[
                ("category", "spot"),
                ("symbol", symbol.as_str()),
                ("interval", "D"),
                ("limit", limit.as_str()),
            ]);
        let response: BybitResponse<KlineResult> = get_json(request, self.name()).await?;
        parse_klines(&response.into_result()?.list)
    }

    async fn current_price(&self, asset: &str) -> Result<f64> {
        let symbol = self.symbol(asset);
        let request = self
            .http_client
            .get(format!("{}/v5/market/tickers", self.base_url))
            .query(&[("category", "spot"), ("symbol", symbol.as_str())]);
        let response: BybitResponse<TickerResult> = get_json(request, self.name()).await?;
        let ticker = response
            .into_result()?
            .list
            .into_iter()
            .next()
            .ok_or_else(|| Error::api(format!("bybit has no ticker for {}", symbol)))?;
        parse_price(&ticker.last_price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_klines_reverses_to_oldest_first() {
        let list = vec![
            vec!["1767312000000", "2", "2", "2", "3150.25", "1", "1"],
            vec!["1767225600000", "2", "2", "2", "3100.00", "1", "1"],
        ]
        .into_iter()
        .map(|row| row.into_iter().map(String::from).collect())
        .collect::<Vec<Vec<String>>>();

        let closes = parse_klines(&list).unwrap();
        assert_eq!(closes[0].close, 3100.0);
        assert_eq!(closes[1].close, 3150.25);
        assert!(closes[0].date < closes[1].date);
    }

    #[test]
    fn test_error_envelope() {
        let response: BybitResponse<KlineResult> = serde_json::from_str(
            r#"{"retCode":10001,"retMsg":"params error: symbol invalid","result":{}}"#,
        )
        .unwrap();
        let err = response.into_result().unwrap_err();
        assert!(err.to_string().contains("10001"));
    }
}
