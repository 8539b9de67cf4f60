//! CryptoCompare historical-data client (tertiary source).

use super::{get_json, PriceSource};
use crate::types::DailyClose;
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::DateTime;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

/// CryptoCompare min-api client.
pub struct CryptoCompareClient {
    base_url: String,
    quote: String,
    api_key: Option<String>,
    http_client: reqwest::Client,
}

impl CryptoCompareClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://min-api.cryptocompare.com";
    const MAX_LIMIT: usize = 2000;

    pub fn new(
        base_url: Option<String>,
        quote: &str,
        api_key: Option<String>,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            base_url: base_url.unwrap_or_else(|| Self::DEFAULT_BASE_URL.to_string()),
            quote: Self::fiat_quote(quote),
            api_key,
            http_client,
        }
    }

    /// CryptoCompare aggregates against fiat; stablecoin quotes map to USD.
    fn fiat_quote(quote: &str) -> String {
        match quote.to_uppercase().as_str() {
            "USDT" | "USDC" | "BUSD" => "USD".to_string(),
            other => other.to_string(),
        }
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        let request = self.http_client.get(format!("{}{}", self.base_url, path));
        match &self.api_key {
            Some(key) => request.header("authorization", format!("Apikey {}", key)),
            None => request,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct HistoDayResponse {
    #[serde(rename = "Response")]
    pub response: String,
    #[serde(rename = "Message", default)]
    pub message: String,
    #[serde(rename = "Data")]
    pub data: Option<HistoDayData>,
}

#[derive(Debug, Deserialize)]
pub struct HistoDayData {
    #[serde(rename = "Data", default)]
    pub data: Vec<HistoDayPoint>,
}

#[derive(Debug, Deserialize)]
pub struct HistoDayPoint {
    pub time: i64,
    pub close: f64,
}

/// Convert a histoday payload into closes, dropping zero-price padding.
///
/// CryptoCompare pads the start of young listings with zero closes.
pub fn parse_histoday(response: HistoDayResponse) -> Result<Vec<DailyClose>> {
    if response.response != "Success" {
        return Err(Error::api(format!(
            "cryptocompare error: {}",
            response.message
        )));
    }

    let points = response.data.map(|d| d.data).unwrap_or_default();
    points
        .into_iter()
        .filter(|p| p.close > 0.0)
        .map(|p| {
            let date = DateTime::from_timestamp(p.time, 0)
                .map(|dt| dt.date_naive())
                .ok_or_else(|| Error::api(format!("invalid timestamp {}", p.time)))?;
            Ok(DailyClose {
                date,
                close: p.close,
            })
        })
        .collect()
}

#[async_trait]
impl PriceSource for CryptoCompareClient {
    fn name(&self) -> &'static str {
        "cryptocompare"
    }

    async fn daily_closes(&self, asset: &str, limit: usize) -> Result<Vec<DailyClose>> {
        // `limit` counts intervals; the endpoint returns limit + 1 points.
        let limit = limit.saturating_sub(1).clamp(1, Self::MAX_LIMIT).to_string();
        let fsym = asset.to_uppercase();
        debug!(fsym = %fsym, tsym = %self.quote, limit = %limit, "Fetching CryptoCompare histoday");

        let request = self.get("/data/v2/histoday").query(&[
            ("fsym", fsym.as_str()),
            ("tsym", self.quote.as_str()),
            ("limit", limit.as_str()),
        ]);
        let response: HistoDayResponse = get_json(request, self.name()).await?;
        parse_histoday(response)
    }

    async fn current_price(&self, asset: &str) -> Result<f64> {
        let fsym = asset.to_uppercase();
        let request = self
            .get("/data/price")
            .query(&[("fsym", fsym.as_str()), ("tsyms", self.quote.as_str())]);
        let prices: HashMap<String, serde_json::Value> = get_json(request, self.name()).await?;

        prices
            .get(&self.quote)
            .and_then(|v| v.as_f64())
            .filter(|p| *p > 0.0)
            .ok_or_else(|| Error::api(format!("cryptocompare has no {} price for {}", self.quote, fsym)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_histoday_skips_zero_padding() {
        let response: HistoDayResponse = serde_json::from_str(
            r#"{"Response":"Success","Message":"","Data":{"Data":[
                {"time":1767139200,"close":0},
                {"time":1767225600,"close":185.2},
                {"time":1767312000,"close":190.75}
            ]}}"#,
        )
        .unwrap();

        let closes = parse_histoday(response).unwrap();
        assert_eq!(closes.len(), 2);
        assert_eq!(closes[0].date.to_string(), "2026-01-01");
        assert_eq!(closes[1].close, 190.75);
    }

    #[test]
    fn test_parse_histoday_error_response() {
        let response: HistoDayResponse = serde_json::from_str(
            r#"{"Response":"Error","Message":"fsym param is invalid","Data":{}}"#,
        )
        .unwrap();
        assert!(parse_histoday(response).is_err());
    }

    #[test]
    fn test_stablecoin_quote_maps_to_usd() {
        assert_eq!(CryptoCompareClient::fiat_quote("usdt"), "USD");
        assert_eq!(CryptoCompareClient::fiat_quote("EUR"), "EUR");
    }
}
