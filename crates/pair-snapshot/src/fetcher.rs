//! Daily close fetching with per-leg fallback across price sources.

use chrono::NaiveDate;
use futures_util::future::join;
use pairscope_core::api::{
    build_http_client, BinanceClient, BybitClient, CryptoCompareClient, PriceSource,
};
use pairscope_core::config::SourcesConfig;
use pairscope_core::types::{AssetPair, DailyClose, PairSeries};
use pairscope_core::{Error, Result};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

type Aligned = (Vec<NaiveDate>, Vec<f64>, Vec<f64>);

/// Completed history for one leg plus the in-progress close, if any.
#[derive(Debug, Clone)]
struct Leg {
    history: Vec<DailyClose>,
    latest: Option<f64>,
    source: &'static str,
}

impl Leg {
    /// Split raw closes into completed days and the still-forming one.
    fn from_closes(mut closes: Vec<DailyClose>, source: &'static str) -> Self {
        let latest = closes.pop().map(|c| c.close);
        Self {
            history: closes,
            latest,
            source,
        }
    }
}

/// Fetches aligned pair series from a primary source with ordered fallbacks.
pub struct PriceFetcher {
    primary: Box<dyn PriceSource>,
    fallbacks: Vec<Box<dyn PriceSource>>,
}

impl PriceFetcher {
    pub fn new(primary: Box<dyn PriceSource>, fallbacks: Vec<Box<dyn PriceSource>>) -> Self {
        Self { primary, fallbacks }
    }

    /// Binance first, then Bybit, then CryptoCompare, sharing one HTTP client.
    pub fn from_config(sources: &SourcesConfig) -> Result<Self> {
        let http_client = build_http_client()?;

        let primary = BinanceClient::new(
            Some(sources.binance_url.clone()),
            &sources.quote,
            http_client.clone(),
        );
        let secondary = BybitClient::new(
            Some(sources.bybit_url.clone()),
            &sources.quote,
            http_client.clone(),
        );
        let tertiary = CryptoCompareClient::new(
            Some(sources.cryptocompare_url.clone()),
            &sources.quote,
            sources.cryptocompare_api_key.clone(),
            http_client,
        );

        Ok(Self::new(
            Box::new(primary),
            vec![Box::new(secondary), Box::new(tertiary)],
        ))
    }

    /// Fetch `days` aligned daily closes for both legs of `pair`, plus
    /// current prices.
    pub async fn fetch_pair(&self, pair: &AssetPair, days: usize) -> Result<PairSeries> {
        let limit = days + 1;
        // Longest partial window seen, for the error when every source falls short.
        let mut best_aligned = 0;
        let mut best_short = 0;

        let (r1, r2) = join(
            self.fetch_leg(self.primary.as_ref(), &pair.asset1, limit),
            self.fetch_leg(self.primary.as_ref(), &pair.asset2, limit),
        )
        .await;
        let mut leg1 = usable_leg(r1, &pair.asset1, days, &mut best_short);
        let mut leg2 = usable_leg(r2, &pair.asset2, days, &mut best_short);

        if let (Some(l1), Some(l2)) = (&leg1, &leg2) {
            match try_align(l1, l2, days) {
                Ok(aligned) => return self.assemble(pair, aligned, l1, l2).await,
                Err(got) => {
                    best_aligned = best_aligned.max(got);
                    warn!(pair = %pair, got, needed = days, "Primary legs do not align, trying fallbacks");
                    leg1 = None;
                    leg2 = None;
                }
            }
        }

        for source in &self.fallbacks {
            let need1 = leg1.is_none();
            let need2 = leg2.is_none();
            debug!(pair = %pair, source = source.name(), need1, need2, "Fetching missing legs");

            match (need1, need2) {
                (true, true) => {
                    let (r1, r2) = join(
                        self.fetch_leg(source.as_ref(), &pair.asset1, limit),
                        self.fetch_leg(source.as_ref(), &pair.asset2, limit),
                    )
                    .await;
                    leg1 = usable_leg(r1, &pair.asset1, days, &mut best_short);
                    leg2 = usable_leg(r2, &pair.asset2, days, &mut best_short);
                }
                (true, false) => {
                    let r1 = self.fetch_leg(source.as_ref(), &pair.asset1, limit).await;
                    leg1 = usable_leg(r1, &pair.asset1, days, &mut best_short);
                }
                (false, true) => {
                    let r2 = self.fetch_leg(source.as_ref(), &pair.asset2, limit).await;
                    leg2 = usable_leg(r2, &pair.asset2, days, &mut best_short);
                }
                (false, false) => {}
            }

            if let (Some(l1), Some(l2)) = (&leg1, &leg2) {
                match try_align(l1, l2, days) {
                    Ok(aligned) => return self.assemble(pair, aligned, l1, l2).await,
                    Err(got) => {
                        best_aligned = best_aligned.max(got);
                        warn!(pair = %pair, source = source.name(), got, needed = days, "Legs do not align");
                        // Discard what this source supplied; a leg from an
                        // earlier source stays.
                        if need1 {
                            leg1 = None;
                        }
                        if need2 {
                            leg2 = None;
                        }
                    }
                }
            }
        }

        let got = [&leg1, &leg2]
            .iter()
            .filter_map(|l| l.as_ref().map(|l| l.history.len()))
            .min()
            .unwrap_or(0)
            .max(best_aligned)
            .max(best_short);

        Err(Error::InsufficientData {
            pair: pair.to_string(),
            needed: days,
            got,
        })
    }

    async fn fetch_leg(
        &self,
        source: &dyn PriceSource,
        asset: &str,
        limit: usize,
    ) -> Result<Leg> {
        let closes = source.daily_closes(asset, limit).await.map_err(|e| {
            warn!(source = source.name(), asset, error = %e, "Daily closes request failed");
            e
        })?;
        Ok(Leg::from_closes(closes, source.name()))
    }

    /// Attach current prices and the source label to an aligned window.
    async fn assemble(
        &self,
        pair: &AssetPair,
        (dates, prices1, prices2): Aligned,
        leg1: &Leg,
        leg2: &Leg,
    ) -> Result<PairSeries> {
        let (current1, current2) = join(
            self.current_price(&pair.asset1, leg1.latest),
            self.current_price(&pair.asset2, leg2.latest),
        )
        .await;

        let source = if leg1.source == leg2.source {
            leg1.source.to_string()
        } else {
            format!("{}+{}", leg1.source, leg2.source)
        };

        info!(pair = %pair, days = dates.len(), source = %source, "Fetched pair series");

        Ok(PairSeries {
            pair: pair.clone(),
            dates,
            prices1,
            prices2,
            current1: current1?,
            current2: current2?,
            source,
        })
    }

    /// Spot price from the first source that answers, else the in-progress
    /// candle close.
    async fn current_price(&self, asset: &str, latest_close: Option<f64>) -> Result<f64> {
        let sources =
            std::iter::once(self.primary.as_ref()).chain(self.fallbacks.iter().map(|s| s.as_ref()));

        for source in sources {
            match source.current_price(asset).await {
                Ok(price) => return Ok(price),
                Err(e) => {
                    warn!(source = source.name(), asset, error = %e, "Current price request failed")
                }
            }
        }

        match latest_close {
            Some(close) => {
                warn!(asset, "Using latest candle close as current price");
                Ok(close)
            }
            None => Err(Error::api(format!("no current price available for {}", asset))),
        }
    }
}

/// Aligned window of `days` points, or the number of points available.
fn try_align(leg1: &Leg, leg2: &Leg, days: usize) -> std::result::Result<Aligned, usize> {
    let aligned = align_by_date(&leg1.history, &leg2.history, days);
    if aligned.0.len() < days {
        return Err(aligned.0.len());
    }
    Ok(aligned)
}

/// Keep a fetched leg only if it has at least `days` completed closes.
/// `best_short` tracks the longest history that fell short.
fn usable_leg(
    result: Result<Leg>,
    asset: &str,
    days: usize,
    best_short: &mut usize,
) -> Option<Leg> {
    match result {
        Ok(leg) if leg.history.len() >= days => Some(leg),
        Ok(leg) => {
            *best_short = (*best_short).max(leg.history.len());
            warn!(
                source = leg.source,
                asset,
                got = leg.history.len(),
                needed = days,
                "Too few daily closes"
            );
            None
        }
        Err(_) => None,
    }
}

/// Inner-join two close series on date and keep the most recent `days`
/// points, oldest first.
pub fn align_by_date(
    leg1: &[DailyClose],
    leg2: &[DailyClose],
    days: usize,
) -> Aligned {
    let by_date: BTreeMap<NaiveDate, f64> = leg2.iter().map(|c| (c.date, c.close)).collect();

    let mut aligned: Vec<(NaiveDate, f64, f64)> = leg1
        .iter()
        .filter_map(|c| by_date.get(&c.date).map(|&p2| (c.date, c.close, p2)))
        .collect();
    aligned.sort_by_key(|(date, _, _)| *date);
    aligned.dedup_by_key(|(date, _, _)| *date);

    let skip = aligned.len().saturating_sub(days);
    let mut dates = Vec::with_capacity(days);
    let mut prices1 = Vec::with_capacity(days);
    let mut prices2 = Vec::with_capacity(days);
    for (date, p1, p2) in aligned.into_iter().skip(skip) {
        dates.push(date);
        prices1.push(p1);
        prices2.push(p2);
    }
    (dates, prices1, prices2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Duration;
    use mockall::mock;

    mock! {
        pub Source {}

        #[async_trait]
        impl PriceSource for Source {
            fn name(&self) -> &'static str;
            async fn daily_closes(&self, asset: &str, limit: usize) -> Result<Vec<DailyClose>>;
            async fn current_price(&self, asset: &str) -> Result<f64>;
        }
    }

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()
    }

    /// `n` consecutive closes starting `offset` days after `start()`.
    fn closes(n: usize, offset: i64, base: f64) -> Vec<DailyClose> {
        (0..n)
            .map(|i| DailyClose {
                date: start() + Duration::days(offset + i as i64),
                close: base + i as f64,
            })
            .collect()
    }

    fn source(name: &'static str) -> MockSource {
        let mut s = MockSource::new();
        s.expect_name().return_const(name);
        s
    }

    fn failing() -> Error {
        Error::Api {
            message: "boom".to_string(),
            status: Some(500),
        }
    }

    #[test]
    fn test_align_by_date_intersects_and_trims() {
        let a = closes(10, 0, 100.0);
        let b = closes(10, 3, 50.0);
        let (dates, p1, p2) = align_by_date(&a, &b, 5);

        assert_eq!(dates.len(), 5);
        assert_eq!(dates[0], start() + Duration::days(5));
        assert_eq!(*dates.last().unwrap(), start() + Duration::days(9));
        assert_eq!(p1[0], 105.0);
        assert_eq!(p2[0], 52.0);
    }

    #[test]
    fn test_align_by_date_short_overlap() {
        let a = closes(5, 0, 1.0);
        let b = closes(5, 3, 1.0);
        let (dates, _, _) = align_by_date(&a, &b, 5);
        assert_eq!(dates.len(), 2);
    }

    #[tokio::test]
    async fn test_primary_serves_both_legs() {
        let mut primary = source("binance");
        primary
            .expect_daily_closes()
            .withf(|asset, limit| asset == "BTC" && *limit == 8)
            .returning(|_, _| Ok(closes(8, 0, 100.0)));
        primary
            .expect_daily_closes()
            .withf(|asset, limit| asset == "ETH" && *limit == 8)
            .returning(|_, _| Ok(closes(8, 0, 10.0)));
        primary
            .expect_current_price()
            .returning(|asset| Ok(if asset == "BTC" { 200.0 } else { 20.0 }));

        // Fallbacks must not be touched.
        let fetcher = PriceFetcher::new(
            Box::new(primary),
            vec![Box::new(source("bybit")), Box::new(source("cryptocompare"))],
        );

        let series = fetcher.fetch_pair(&AssetPair::new("BTC", "ETH"), 7).await.unwrap();
        assert_eq!(series.len(), 7);
        assert_eq!(series.source, "binance");
        // In-progress candle (index 7) is dropped.
        assert_eq!(*series.prices1.last().unwrap(), 106.0);
        assert_eq!(series.prices1[0], 100.0);
        assert_eq!(series.current1, 200.0);
        assert_eq!(series.current2, 20.0);
    }

    #[tokio::test]
    async fn test_one_leg_falls_back_to_secondary() {
        let mut primary = source("binance");
        primary
            .expect_daily_closes()
            .withf(|asset, limit| asset == "SOL" && *limit == 6)
            .returning(|_, _| Ok(closes(6, 0, 100.0)));
        primary
            .expect_daily_closes()
            .withf(|asset, limit| asset == "AVAX" && *limit == 6)
            .returning(|_, _| Err(failing()));
        primary.expect_current_price().returning(|_| Ok(1.0));

        let mut secondary = source("bybit");
        secondary
            .expect_daily_closes()
            .withf(|asset, limit| asset == "AVAX" && *limit == 6)
            .times(1)
            .returning(|_, _| Ok(closes(6, 0, 30.0)));

        let fetcher = PriceFetcher::new(
            Box::new(primary),
            vec![Box::new(secondary), Box::new(source("cryptocompare"))],
        );

        let series = fetcher.fetch_pair(&AssetPair::new("SOL", "AVAX"), 5).await.unwrap();
        assert_eq!(series.len(), 5);
        assert_eq!(series.source, "binance+bybit");
        assert_eq!(series.prices2[0], 30.0);
    }

    #[tokio::test]
    async fn test_both_legs_fall_through_to_tertiary() {
        let mut primary = source("binance");
        primary.expect_daily_closes().returning(|_, _| Err(failing()));
        primary.expect_current_price().returning(|_| Err(failing()));

        let mut secondary = source("bybit");
        secondary
            .expect_daily_closes()
            .times(2)
            .returning(|_, _| Err(failing()));
        secondary.expect_current_price().returning(|_| Err(failing()));

        let mut tertiary = source("cryptocompare");
        tertiary
            .expect_daily_closes()
            .times(2)
            .returning(|_, _| Ok(closes(4, 0, 10.0)));
        tertiary.expect_current_price().returning(|_| Ok(42.0));

        let fetcher =
            PriceFetcher::new(Box::new(primary), vec![Box::new(secondary), Box::new(tertiary)]);

        let series = fetcher.fetch_pair(&AssetPair::new("BTC", "SOL"), 3).await.unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.source, "cryptocompare");
        assert_eq!(series.current1, 42.0);
    }

    #[test]
    fn test_current_price_falls_back_to_latest_candle() {
        let mut primary = source("binance");
        primary
            .expect_daily_closes()
            .returning(|_, _| Ok(closes(4, 0, 10.0)));
        primary.expect_current_price().returning(|_| Err(failing()));

        let mut secondary = source("bybit");
        secondary.expect_current_price().returning(|_| Err(failing()));

        let fetcher = PriceFetcher::new(Box::new(primary), vec![Box::new(secondary)]);

        let series =
            tokio_test::block_on(fetcher.fetch_pair(&AssetPair::new("BTC", "ETH"), 3)).unwrap();
        // Latest (in-progress) close is 10 + 3.
        assert_eq!(series.current1, 13.0);
        assert_eq!(series.current2, 13.0);
    }

    #[tokio::test]
    async fn test_exhausted_sources_report_insufficient_data() {
        let mut primary = source("binance");
        primary
            .expect_daily_closes()
            .returning(|_, _| Ok(closes(3, 0, 10.0)));

        let mut secondary = source("bybit");
        secondary.expect_daily_closes().returning(|_, _| Err(failing()));

        let fetcher = PriceFetcher::new(Box::new(primary), vec![Box::new(secondary)]);

        let result = fetcher.fetch_pair(&AssetPair::new("BTC", "ETH"), 30).await;
        match result {
            Err(Error::InsufficientData { pair, needed, got }) => {
                assert_eq!(pair, "BTC/ETH");
                assert_eq!(needed, 30);
                // Three closes minus the in-progress candle.
                assert_eq!(got, 2);
            }
            other => panic!("expected InsufficientData, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_misaligned_primary_legs_are_both_refetched() {
        let mut primary = source("binance");
        primary
            .expect_daily_closes()
            .withf(|asset, _| asset == "BTC")
            .returning(|_, _| Ok(closes(6, 0, 100.0)));
        // Long enough, but a different month entirely.
        primary
            .expect_daily_closes()
            .withf(|asset, _| asset == "ETH")
            .returning(|_, _| Ok(closes(6, 40, 10.0)));
        primary.expect_current_price().returning(|_| Ok(1.0));

        let mut secondary = source("bybit");
        secondary
            .expect_daily_closes()
            .times(2)
            .returning(|asset, _| Ok(closes(6, 0, if asset == "BTC" { 200.0 } else { 20.0 })));

        let fetcher = PriceFetcher::new(
            Box::new(primary),
            vec![Box::new(secondary), Box::new(source("cryptocompare"))],
        );

        let series = fetcher.fetch_pair(&AssetPair::new("BTC", "ETH"), 5).await.unwrap();
        assert_eq!(series.source, "bybit");
        assert_eq!(series.prices1[0], 200.0);
        assert_eq!(series.prices2[0], 20.0);
    }

    #[tokio::test]
    async fn test_misaligned_fallback_leg_is_dropped_and_primary_leg_kept() {
        let mut primary = source("binance");
        primary
            .expect_daily_closes()
            .withf(|asset, _| asset == "BTC")
            .returning(|_, _| Ok(closes(6, 0, 100.0)));
        primary
            .expect_daily_closes()
            .withf(|asset, _| asset == "SOL")
            .returning(|_, _| Err(failing()));
        primary.expect_current_price().returning(|_| Ok(1.0));

        let mut secondary = source("bybit");
        secondary
            .expect_daily_closes()
            .withf(|asset, _| asset == "SOL")
            .times(1)
            .returning(|_, _| Ok(closes(6, 40, 30.0)));

        let mut tertiary = source("cryptocompare");
        tertiary
            .expect_daily_closes()
            .withf(|asset, _| asset == "SOL")
            .times(1)
            .returning(|_, _| Ok(closes(6, 0, 50.0)));

        let fetcher =
            PriceFetcher::new(Box::new(primary), vec![Box::new(secondary), Box::new(tertiary)]);

        let series = fetcher.fetch_pair(&AssetPair::new("BTC", "SOL"), 5).await.unwrap();
        assert_eq!(series.source, "binance+cryptocompare");
        assert_eq!(series.prices1[0], 100.0);
        assert_eq!(series.prices2[0], 50.0);
    }

    #[tokio::test]
    async fn test_insufficient_data_reports_longest_short_leg() {
        let mut primary = source("binance");
        primary
            .expect_daily_closes()
            .withf(|asset, _| asset == "BTC")
            .returning(|_, _| Ok(closes(13, 0, 10.0)));
        primary
            .expect_daily_closes()
            .withf(|asset, _| asset == "ETH")
            .returning(|_, _| Err(failing()));

        let mut secondary = source("bybit");
        secondary
            .expect_daily_closes()
            .returning(|_, _| Ok(closes(5, 0, 10.0)));

        let fetcher = PriceFetcher::new(Box::new(primary), vec![Box::new(secondary)]);

        match fetcher.fetch_pair(&AssetPair::new("BTC", "ETH"), 30).await {
            Err(Error::InsufficientData { got, .. }) => assert_eq!(got, 12),
            other => panic!("expected InsufficientData, got {:?}", other),
        }
    }

    #[test]
    fn test_leg_drops_in_progress_candle() {
        let leg = Leg::from_closes(closes(3, 0, 1.0), "binance");
        assert_eq!(leg.history.len(), 2);
        assert_eq!(leg.latest, Some(3.0));

        let empty = Leg::from_closes(Vec::new(), "bybit");
        assert!(empty.history.is_empty());
        assert_eq!(empty.latest, None);
    }
}
