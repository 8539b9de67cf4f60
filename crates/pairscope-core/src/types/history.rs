//! Persisted trade history, as written by the live trading collaborator.

use serde::{Deserialize, Serialize};

/// A completed trade from the history file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeHistoryRecord {
    pub pair: String,
    pub entry_time: String,
    #[serde(default)]
    pub exit_time: Option<String>,
    #[serde(default)]
    pub entry_z_score: f64,
    #[serde(default)]
    pub exit_z_score: f64,
    #[serde(default)]
    pub days_held: f64,
    /// Total P&L of the trade in percent.
    #[serde(rename = "totalPnL", default)]
    pub total_pnl: f64,
}

impl TradeHistoryRecord {
    pub fn is_win(&self) -> bool {
        self.total_pnl > 0.0
    }
}

/// Summary statistics over the whole history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HistoryStats {
    pub total_trades: usize,
    pub wins: usize,
    pub losses: usize,
    /// Win rate in percent.
    pub win_rate: f64,
    #[serde(rename = "avgPnL")]
    pub avg_pnl: f64,
    /// Cumulative P&L in percent.
    #[serde(rename = "totalPnL")]
    pub total_pnl: f64,
}

impl HistoryStats {
    /// Aggregate summary statistics from a list of trades.
    pub fn from_trades(trades: &[TradeHistoryRecord]) -> Self {
        if trades.is_empty() {
            return Self::default();
        }

        let total_trades = trades.len();
        let wins = trades.iter().filter(|t| t.is_win()).count();
        let total_pnl: f64 = trades.iter().map(|t| t.total_pnl).sum();

        Self {
            total_trades,
            wins,
            losses: total_trades - wins,
            win_rate: wins as f64 / total_trades as f64 * 100.0,
            avg_pnl: total_pnl / total_trades as f64,
            total_pnl,
        }
    }
}

/// The history document: `{ "trades": [...], "stats": {...} }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeHistory {
    #[serde(default)]
    pub trades: Vec<TradeHistoryRecord>,
    #[serde(default)]
    pub stats: Option<HistoryStats>,
}

impl TradeHistory {
    /// Stored stats when present, otherwise computed from the trades.
    pub fn summary(&self) -> HistoryStats {
        self.stats
            .clone()
            .unwrap_or_else(|| HistoryStats::from_trades(&self.trades))
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pair: &str, pnl: f64) -> TradeHistoryRecord {
        TradeHistoryRecord {
            pair: pair.to_string(),
            entry_time: "2026-03-01T00:00:00Z".to_string(),
            exit_time: Some("2026-03-04T00:00:00Z".to_string()),
            entry_z_score: 2.2,
            exit_z_score: 0.3,
            days_held: 3.0,
            total_pnl: pnl,
        }
    }

    #[test]
    fn test_stats_from_trades() {
        let trades = vec![record("BTC/ETH", 2.0), record("ETH/SOL", -1.0), record("BTC/SOL", 2.0)];
        let stats = HistoryStats::from_trades(&trades);

        assert_eq!(stats.total_trades, 3);
        assert_eq!(stats.wins, 2);
        assert_eq!(stats.losses, 1);
        assert!((stats.win_rate - 66.666_666).abs() < 1e-3);
        assert!((stats.avg_pnl - 1.0).abs() < 1e-12);
        assert!((stats.total_pnl - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_deserialize_camel_case_document() {
        let json = r#"{
            "trades": [{
                "pair": "BTC/ETH",
                "entryTime": "2026-03-01T00:00:00Z",
                "exitTime": "2026-03-02T12:00:00Z",
                "entryZScore": -2.4,
                "exitZScore": -0.2,
                "daysHeld": 1.5,
                "totalPnL": 0.85
            }],
            "stats": { "totalTrades": 1, "wins": 1, "losses": 0, "winRate": 100, "avgPnL": 0.85, "totalPnL": 0.85 }
        }"#;

        let history: TradeHistory = serde_json::from_str(json).unwrap();
        assert_eq!(history.trades.len(), 1);
        assert_eq!(history.trades[0].entry_z_score, -2.4);
        assert_eq!(history.summary().total_trades, 1);
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let history: TradeHistory = serde_json::from_str("{}").unwrap();
        assert!(history.is_empty());
        assert_eq!(history.summary(), HistoryStats::default());
    }

    #[test]
    fn test_summary_computed_when_stats_absent() {
        let history = TradeHistory {
            trades: vec![record("BTC/ETH", 1.0), record("BTC/ETH", -3.0)],
            stats: None,
        };
        let summary = history.summary();
        assert_eq!(summary.wins, 1);
        assert!((summary.total_pnl + 2.0).abs() < 1e-12);
    }
}
