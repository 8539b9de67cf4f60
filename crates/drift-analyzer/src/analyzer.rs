//! Beta-drift bucketing and outcome statistics.

use pairscope_core::types::Trade;
use serde::Serialize;
use statrs::statistics::Statistics;
use tracing::debug;

/// A half-open drift range `[min, max)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DriftRange {
    pub label: &'static str,
    pub min: f64,
    pub max: f64,
}

impl DriftRange {
    pub const fn new(label: &'static str, min: f64, max: f64) -> Self {
        Self { label, min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value < self.max
    }
}

/// Absolute beta-drift buckets.
pub const ABSOLUTE_DRIFT_BUCKETS: [DriftRange; 5] = [
    DriftRange::new("0.00-0.01", 0.0, 0.01),
    DriftRange::new("0.01-0.05", 0.01, 0.05),
    DriftRange::new("0.05-0.10", 0.05, 0.10),
    DriftRange::new("0.10-0.20", 0.10, 0.20),
    DriftRange::new("0.20+", 0.20, f64::INFINITY),
];

/// Percent beta-drift buckets.
pub const PERCENT_DRIFT_BUCKETS: [DriftRange; 5] = [
    DriftRange::new("0-5%", 0.0, 5.0),
    DriftRange::new("5-10%", 5.0, 10.0),
    DriftRange::new("10-20%", 10.0, 20.0),
    DriftRange::new("20-50%", 20.0, 50.0),
    DriftRange::new("50%+", 50.0, f64::INFINITY),
];

/// Number of trades listed in the top-drift table.
pub const TOP_DRIFT_COUNT: usize = 10;

/// Aggregated outcomes for one drift bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketStats {
    pub range: DriftRange,
    pub count: usize,
    pub wins: usize,
    /// Percent of trades with positive actual ROI.
    pub win_rate: f64,
    pub avg_roi: f64,
    /// Mean of `|error %|`.
    pub avg_error: f64,
    /// Mean of `|actual - predicted|`; only computed for absolute buckets.
    pub avg_roi_diff: Option<f64>,
    pub divergence_count: usize,
    pub divergence_rate: f64,
}

impl BucketStats {
    /// Aggregate `trades`, all of which fall inside `range`.
    ///
    /// Missing ROI or error values contribute zero to the sums while still
    /// counting toward the bucket size.
    fn from_trades(range: DriftRange, trades: &[&Trade], with_roi_diff: bool) -> Self {
        let count = trades.len();
        let n = count as f64;

        let wins = trades.iter().filter(|t| t.win).count();
        let divergence_count = trades.iter().filter(|t| t.diverged).count();

        let roi_sum: f64 = trades.iter().map(|t| t.actual_roi.unwrap_or(0.0)).sum();
        let error_sum: f64 = trades
            .iter()
            .map(|t| t.error_pct.unwrap_or(0.0).abs())
            .sum();

        let avg_roi_diff = with_roi_diff.then(|| {
            trades
                .iter()
                .map(|t| (t.actual_roi.unwrap_or(0.0) - t.predicted_roi.unwrap_or(0.0)).abs())
                .sum::<f64>()
                / n
        });

        Self {
            range,
            count,
            wins,
            win_rate: wins as f64 / n * 100.0,
            avg_roi: roi_sum / n,
            avg_error: error_sum / n,
            avg_roi_diff,
            divergence_count,
            divergence_rate: divergence_count as f64 / n * 100.0,
        }
    }
}

/// Full result of one analysis run.
#[derive(Debug, Clone, Serialize)]
pub struct DriftAnalysis {
    pub total_trades: usize,
    pub trades_with_drift: usize,
    pub trades_with_pct_drift: usize,
    /// Non-empty absolute buckets, ascending.
    pub absolute_buckets: Vec<BucketStats>,
    /// Non-empty percent buckets, ascending.
    pub percent_buckets: Vec<BucketStats>,
    /// Highest-drift trades, descending; ties keep report order.
    pub top_drifts: Vec<Trade>,
    /// Pearson correlation of absolute drift with actual ROI.
    pub drift_roi_correlation: Option<f64>,
}

/// Bucket trades by beta drift and summarize each bucket.
pub fn analyze(trades: &[Trade]) -> DriftAnalysis {
    let with_drift: Vec<&Trade> = trades.iter().filter(|t| t.beta_drift.is_some()).collect();
    let with_pct: Vec<&Trade> = with_drift
        .iter()
        .copied()
        .filter(|t| t.beta_drift_pct.is_some())
        .collect();

    let absolute_buckets = bucketize(&with_drift, &ABSOLUTE_DRIFT_BUCKETS, true, |t| t.beta_drift);
    let percent_buckets = bucketize(&with_pct, &PERCENT_DRIFT_BUCKETS, false, |t| t.beta_drift_pct);

    debug!(
        total = trades.len(),
        with_drift = with_drift.len(),
        with_pct = with_pct.len(),
        absolute_buckets = absolute_buckets.len(),
        percent_buckets = percent_buckets.len(),
        "Drift analysis complete"
    );

    DriftAnalysis {
        total_trades: trades.len(),
        trades_with_drift: with_drift.len(),
        trades_with_pct_drift: with_pct.len(),
        absolute_buckets,
        percent_buckets,
        top_drifts: top_drifts(&with_drift, TOP_DRIFT_COUNT),
        drift_roi_correlation: drift_roi_correlation(&with_drift),
    }
}

fn bucketize(
    trades: &[&Trade],
    ranges: &[DriftRange],
    with_roi_diff: bool,
    value: impl Fn(&Trade) -> Option<f64>,
) -> Vec<BucketStats> {
    ranges
        .iter()
        .filter_map(|range| {
            let members: Vec<&Trade> = trades
                .iter()
                .copied()
                .filter(|t| value(*t).is_some_and(|v| range.contains(v)))
                .collect();
            (!members.is_empty()).then(|| BucketStats::from_trades(*range, &members, with_roi_diff))
        })
        .collect()
}

/// The `limit` trades with the largest absolute drift.
///
/// `sort_by` is stable, so equal drifts stay in report order.
fn top_drifts(trades: &[&Trade], limit: usize) -> Vec<Trade> {
    let mut sorted: Vec<&Trade> = trades.to_vec();
    sorted.sort_by(|a, b| {
        let (a, b) = (a.beta_drift.unwrap_or(0.0), b.beta_drift.unwrap_or(0.0));
        b.total_cmp(&a)
    });
    sorted.into_iter().take(limit).cloned().collect()
}

fn drift_roi_correlation(trades: &[&Trade]) -> Option<f64> {
    let (drifts, rois): (Vec<f64>, Vec<f64>) = trades
        .iter()
        .filter_map(|t| Some((t.beta_drift?, t.actual_roi?)))
        .unzip();

    if drifts.len() < 2 {
        return None;
    }

    let sd_drift = drifts.iter().population_std_dev();
    let sd_roi = rois.iter().population_std_dev();
    if sd_drift == 0.0 || sd_roi == 0.0 {
        return None;
    }

    let cov = drifts.iter().population_covariance(rois.iter());
    Some(cov / (sd_drift * sd_roi))
}
