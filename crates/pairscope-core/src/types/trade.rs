//! Backtest trade rows and the beta-drift fields derived from them.

use serde::{Deserialize, Serialize};

/// Raw numeric columns of one backtest report row, before derivation.
///
/// Every numeric field is optional: a column reading `N/A` (or anything that
/// does not parse) is `None`, never zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TradeRow {
    pub pair: String,
    pub entry_time: String,
    pub exit_time: String,
    pub direction: String,
    pub entry_z: Option<f64>,
    pub exit_z: Option<f64>,
    pub entry_beta: Option<f64>,
    pub exit_beta: Option<f64>,
    pub beta_delta: Option<f64>,
    pub actual_roi: Option<f64>,
    pub predicted_roi: Option<f64>,
    pub error_pct: Option<f64>,
}

/// A parsed backtest trade. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub pair: String,
    pub entry_time: String,
    pub exit_time: String,
    pub direction: String,
    pub entry_z: Option<f64>,
    pub exit_z: Option<f64>,
    pub entry_beta: Option<f64>,
    pub exit_beta: Option<f64>,
    pub actual_roi: Option<f64>,
    pub predicted_roi: Option<f64>,
    pub error_pct: Option<f64>,
    /// Absolute change in hedge ratio between entry and exit.
    pub beta_drift: Option<f64>,
    /// `beta_drift` relative to the entry beta, in percent.
    pub beta_drift_pct: Option<f64>,
    /// Spread moved further from the mean than at entry.
    pub diverged: bool,
    pub win: bool,
}

impl Trade {
    /// Build a trade from a raw row, computing the derived fields.
    pub fn from_row(row: TradeRow) -> Self {
        let beta_drift = absolute_beta_drift(row.beta_delta, row.entry_beta, row.exit_beta);
        let beta_drift_pct = percent_beta_drift(beta_drift, row.entry_beta);

        // Missing z-scores count as zero here.
        let diverged = row.exit_z.unwrap_or(0.0).abs() > row.entry_z.unwrap_or(0.0).abs();
        let win = row.actual_roi.map(|roi| roi > 0.0).unwrap_or(false);

        Self {
            pair: row.pair,
            entry_time: row.entry_time,
            exit_time: row.exit_time,
            direction: row.direction,
            entry_z: row.entry_z,
            exit_z: row.exit_z,
            entry_beta: row.entry_beta,
            exit_beta: row.exit_beta,
            actual_roi: row.actual_roi,
            predicted_roi: row.predicted_roi,
            error_pct: row.error_pct,
            beta_drift,
            beta_drift_pct,
            diverged,
            win,
        }
    }
}

/// Prefer the explicit delta column, else `|exit - entry|`.
pub fn absolute_beta_drift(
    delta: Option<f64>,
    entry_beta: Option<f64>,
    exit_beta: Option<f64>,
) -> Option<f64> {
    match (delta, entry_beta, exit_beta) {
        (Some(d), _, _) => Some(d.abs()),
        (None, Some(entry), Some(exit)) => Some((exit - entry).abs()),
        _ => None,
    }
}

/// Drift as a percentage of `|entry_beta|`; `None` when entry beta is absent or zero.
pub fn percent_beta_drift(drift: Option<f64>, entry_beta: Option<f64>) -> Option<f64> {
    let drift = drift?;
    let entry = entry_beta?;
    if entry == 0.0 {
        return None;
    }
    let pct = drift / entry.abs() * 100.0;
    pct.is_finite().then_some(pct)
}
