//! History Viewer
//!
//! Loads the trade history file kept by the live trader and renders a
//! console summary of completed trades.

use chrono::{DateTime, NaiveDate};
use pairscope_core::types::{TradeHistory, TradeHistoryRecord};
use pairscope_core::{Error, Result};
use std::path::Path;
use tracing::debug;

/// Default number of recent trades shown.
pub const RECENT_TRADES: usize = 20;

/// Read and decode a history file.
pub fn load_history(path: &Path) -> Result<TradeHistory> {
    let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => {
            Error::MissingInput(format!("trade history {} not found", path.display()))
        }
        _ => Error::Io(e),
    })?;

    let history: TradeHistory = serde_json::from_str(&content)?;
    debug!(
        path = %path.display(),
        trades = history.trades.len(),
        stored_stats = history.stats.is_some(),
        "Loaded trade history"
    );
    Ok(history)
}

/// `YYYY-MM-DD` for RFC 3339 timestamps or plain dates; anything else is
/// shown as written.
pub fn format_date(raw: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.format("%Y-%m-%d").to_string();
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.format("%Y-%m-%d").to_string();
    }
    raw.to_string()
}

fn trade_line(trade: &TradeHistoryRecord) -> String {
    let exit = trade
        .exit_time
        .as_deref()
        .map(format_date)
        .unwrap_or_else(|| "-".to_string());

    format!(
        "  {:<10} {} -> {}  z {:.2}→{:.2}  {:.1}d  {:+.2}%",
        trade.pair,
        format_date(&trade.entry_time),
        exit,
        trade.entry_z_score,
        trade.exit_z_score,
        trade.days_held,
        trade.total_pnl
    )
}

/// Render the summary and the `limit` most recent trades, newest first.
///
/// Trades are assumed to be stored in completion order.
pub fn render_history(history: &TradeHistory, limit: usize) -> String {
    if history.is_empty() {
        return "No completed trades yet.\n".to_string();
    }

    let stats = history.summary();
    let mut lines = vec![
        "=== Trade History ===".to_string(),
        format!("Total trades:   {}", stats.total_trades),
        format!(
            "Win rate:       {:.1}% ({}W / {}L)",
            stats.win_rate, stats.wins, stats.losses
        ),
        format!("Average P&L:    {:+.2}%", stats.avg_pnl),
        format!("Cumulative P&L: {:+.2}%", stats.total_pnl),
        String::new(),
        "Recent trades (newest first):".to_string(),
    ];
    lines.extend(history.trades.iter().rev().take(limit).map(trade_line));

    let omitted = history.trades.len().saturating_sub(limit);
    if omitted > 0 {
        lines.push(format!("... and {} more trades", omitted));
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}
