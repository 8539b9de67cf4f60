//! Sequential snapshot run over every configured pair and timeframe.

use crate::fetcher::PriceFetcher;
use crate::statistics::compute_pair_statistics;
use pairscope_core::types::{AssetPair, PairStatistics};
use std::time::Duration;
use tracing::{info, warn};

/// Outcome of one pair over one lookback window.
#[derive(Debug, Clone)]
pub struct TimeframeResult {
    pub days: usize,
    /// Source label for the price history, when it was fetched.
    pub source: Option<String>,
    /// Statistics, or the error message shown in the report.
    pub outcome: Result<PairStatistics, String>,
}

/// All timeframes computed for one pair.
#[derive(Debug, Clone)]
pub struct PairSnapshot {
    pub pair: AssetPair,
    pub timeframes: Vec<TimeframeResult>,
}

impl PairSnapshot {
    /// Longest timeframe that produced statistics.
    pub fn longest_success(&self) -> Option<(usize, &PairStatistics)> {
        self.timeframes
            .iter()
            .filter_map(|tf| tf.outcome.as_ref().ok().map(|stats| (tf.days, stats)))
            .max_by_key(|(days, _)| *days)
    }

    pub fn failures(&self) -> usize {
        self.timeframes.iter().filter(|tf| tf.outcome.is_err()).count()
    }
}

/// Fetch and analyze one pair over one window. Errors are captured in the
/// result rather than returned.
pub async fn snapshot_timeframe(
    fetcher: &PriceFetcher,
    pair: &AssetPair,
    days: usize,
) -> TimeframeResult {
    let series = match fetcher.fetch_pair(pair, days).await {
        Ok(series) => series,
        Err(e) => {
            warn!(pair = %pair, days, error = %e, "Failed to fetch pair series");
            return TimeframeResult {
                days,
                source: None,
                outcome: Err(e.to_string()),
            };
        }
    };

    let outcome = compute_pair_statistics(&series).map_err(|e| {
        warn!(pair = %pair, days, error = %e, "Failed to compute statistics");
        e.to_string()
    });

    TimeframeResult {
        days,
        source: Some(series.source),
        outcome,
    }
}

/// Run every pair through every timeframe, pausing `pair_delay` between pairs.
pub async fn run_snapshot(
    fetcher: &PriceFetcher,
    pairs: &[AssetPair],
    timeframes: &[usize],
    pair_delay: Duration,
) -> Vec<PairSnapshot> {
    let mut snapshots = Vec::with_capacity(pairs.len());

    for (i, pair) in pairs.iter().enumerate() {
        if i > 0 && !pair_delay.is_zero() {
            tokio::time::sleep(pair_delay).await;
        }

        info!(pair = %pair, "Analyzing pair");
        let mut results = Vec::with_capacity(timeframes.len());
        for &days in timeframes {
            results.push(snapshot_timeframe(fetcher, pair, days).await);
        }

        snapshots.push(PairSnapshot {
            pair: pair.clone(),
            timeframes: results,
        });
    }

    snapshots
}
