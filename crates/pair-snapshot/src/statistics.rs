//! Pair statistics: returns, hedge ratio, spread z-score, and a heuristic
//! cointegration check.
//!
//! The cointegration flag is an autocorrelation heuristic, not a unit-root
//! test. Its thresholds are fixed so results stay comparable across runs.

use pairscope_core::types::{PairSeries, PairStatistics, SpreadSignal};
use pairscope_core::{Error, Result};

/// Maximum number of recent spreads in the z-score window.
pub const ZSCORE_WINDOW: usize = 30;
/// Pseudo-ADF statistic below which a spread counts as cointegrated.
pub const ADF_THRESHOLD: f64 = -2.5;
/// Mean-reversion rate above which the autocorrelation branch may apply.
pub const MEAN_REVERSION_THRESHOLD: f64 = 0.5;
/// Largest |lag-1 autocorrelation| accepted by the mean-reversion branch.
pub const AUTOCORR_THRESHOLD: f64 = 0.3;

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population covariance. `population_covariance(x, x)` is the variance.
fn population_covariance(a: &[f64], b: &[f64]) -> f64 {
    let (ma, mb) = (mean(a), mean(b));
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - ma) * (y - mb))
        .sum::<f64>()
        / a.len() as f64
}

/// Daily simple returns `(p[i] - p[i-1]) / p[i-1]`.
pub fn simple_returns(prices: &[f64]) -> Vec<f64> {
    prices.windows(2).map(|w| (w[1] - w[0]) / w[0]).collect()
}

/// Correlation of the two return series and the hedge ratio
/// `beta = cov(r1, r2) / var(r2)`.
pub fn correlation_and_beta(r1: &[f64], r2: &[f64]) -> Result<(f64, f64)> {
    if r1.len() != r2.len() || r1.len() < 2 {
        return Err(Error::DegenerateSeries(format!(
            "need two equal-length return series of at least 2 points, got {} and {}",
            r1.len(),
            r2.len()
        )));
    }

    let cov = population_covariance(r1, r2);
    let var1 = population_covariance(r1, r1);
    let var2 = population_covariance(r2, r2);

    if var2 == 0.0 || var1 == 0.0 {
        return Err(Error::DegenerateSeries(
            "return series has zero variance".to_string(),
        ));
    }

    let correlation = cov / (var1.sqrt() * var2.sqrt());
    let beta = cov / var2;
    Ok((correlation, beta))
}

/// Log spread `ln(p1) - beta * ln(p2)` for each day.
pub fn log_spread(prices1: &[f64], prices2: &[f64], beta: f64) -> Result<Vec<f64>> {
    prices1
        .iter()
        .zip(prices2)
        .map(|(&p1, &p2)| spread_at(p1, p2, beta))
        .collect()
}

fn spread_at(p1: f64, p2: f64, beta: f64) -> Result<f64> {
    if p1 <= 0.0 || p2 <= 0.0 {
        return Err(Error::DegenerateSeries(format!(
            "non-positive price in spread ({}, {})",
            p1, p2
        )));
    }
    Ok(p1.ln() - beta * p2.ln())
}

/// Rolling window summary and the current spread's z-score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZScore {
    pub window: usize,
    pub mean: f64,
    pub std: f64,
    pub zscore: f64,
}

/// Z-score of `current` against the last `min(30, len)` spreads.
///
/// A flat window has no defined z-score and is reported as an error.
pub fn rolling_zscore(spreads: &[f64], current: f64) -> Result<ZScore> {
    if spreads.is_empty() {
        return Err(Error::DegenerateSeries("empty spread series".to_string()));
    }

    let window = ZSCORE_WINDOW.min(spreads.len());
    let recent = &spreads[spreads.len() - window..];
    let mean = mean(recent);
    let std = population_covariance(recent, recent).sqrt();

    if std == 0.0 || !std.is_finite() {
        return Err(Error::DegenerateSeries(
            "spread window has zero standard deviation".to_string(),
        ));
    }

    Ok(ZScore {
        window,
        mean,
        std,
        zscore: (current - mean) / std,
    })
}

/// Fraction of day-to-day transitions where a deviation from `mean` is
/// followed by a move back toward it.
pub fn mean_reversion_rate(spreads: &[f64], mean: f64) -> f64 {
    if spreads.len() < 2 {
        return 0.0;
    }

    let transitions = spreads.len() - 1;
    let reverting = spreads
        .windows(2)
        .filter(|w| (w[0] - mean) * (w[1] - w[0]) < 0.0)
        .count();

    reverting as f64 / transitions as f64
}

/// Lag-1 autocorrelation of `values`; zero when the variance is zero.
pub fn lag1_autocorrelation(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }

    let m = mean(values);
    let n = values.len() as f64;
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / n;
    if variance == 0.0 {
        return 0.0;
    }

    let autocovariance = values
        .windows(2)
        .map(|w| (w[1] - m) * (w[0] - m))
        .sum::<f64>()
        / n;

    autocovariance / variance
}

/// Heuristic cointegration result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CointegrationCheck {
    pub autocorrelation: f64,
    pub pseudo_adf: f64,
    pub cointegrated: bool,
}

/// The cointegration decision rule.
pub fn is_cointegrated(pseudo_adf: f64, mean_reversion_rate: f64, autocorrelation: f64) -> bool {
    pseudo_adf < ADF_THRESHOLD
        || (mean_reversion_rate > MEAN_REVERSION_THRESHOLD
            && autocorrelation.abs() < AUTOCORR_THRESHOLD)
}

/// Run the heuristic on a spread series.
///
/// The statistic is `-rho * sqrt(N)`, where `rho` is the lag-1
/// autocorrelation of the spread's first differences and `N` the number of
/// spreads.
pub fn cointegration_check(spreads: &[f64], mean_reversion_rate: f64) -> CointegrationCheck {
    let diffs: Vec<f64> = spreads.windows(2).map(|w| w[1] - w[0]).collect();
    let autocorrelation = lag1_autocorrelation(&diffs);
    let pseudo_adf = -autocorrelation * (spreads.len() as f64).sqrt();

    CointegrationCheck {
        autocorrelation,
        pseudo_adf,
        cointegrated: is_cointegrated(pseudo_adf, mean_reversion_rate, autocorrelation),
    }
}

/// Mean-reversion half-life in days from an AR(1) fit of spread changes on
/// lagged levels. `None` unless the fitted slope lies in `(-1, 0)`.
pub fn half_life(spreads: &[f64]) -> Option<f64> {
    if spreads.len() < 3 {
        return None;
    }

    let lagged = &spreads[..spreads.len() - 1];
    let changes: Vec<f64> = spreads.windows(2).map(|w| w[1] - w[0]).collect();

    let var = population_covariance(lagged, lagged);
    if var == 0.0 {
        return None;
    }
    let lambda = population_covariance(&changes, lagged) / var;

    if lambda <= -1.0 || lambda >= 0.0 {
        return None;
    }
    let hl = -std::f64::consts::LN_2 / (1.0 + lambda).ln();
    hl.is_finite().then_some(hl)
}

/// Full statistics pipeline for one aligned pair series.
pub fn compute_pair_statistics(series: &PairSeries) -> Result<PairStatistics> {
    if series.len() < 3 || series.prices1.len() != series.prices2.len() {
        return Err(Error::InsufficientData {
            pair: series.pair.to_string(),
            needed: 3,
            got: series.len(),
        });
    }

    let returns1 = simple_returns(&series.prices1);
    let returns2 = simple_returns(&series.prices2);
    let (correlation, beta) = correlation_and_beta(&returns1, &returns2)?;

    let spreads = log_spread(&series.prices1, &series.prices2, beta)?;
    let current_spread = spread_at(series.current1, series.current2, beta)?;
    let z = rolling_zscore(&spreads, current_spread)?;

    let mean_reversion_rate = mean_reversion_rate(&spreads, z.mean);
    let check = cointegration_check(&spreads, mean_reversion_rate);

    Ok(PairStatistics {
        correlation,
        beta,
        current_spread,
        mean_spread: z.mean,
        spread_std: z.std,
        zscore: z.zscore,
        mean_reversion_rate,
        autocorrelation: check.autocorrelation,
        pseudo_adf: check.pseudo_adf,
        cointegrated: check.cointegrated,
        half_life: half_life(&spreads),
        signal: SpreadSignal::from_zscore(z.zscore),
        data_points: series.len(),
    })
}
