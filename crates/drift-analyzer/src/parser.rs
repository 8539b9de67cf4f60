//! Markdown backtest report parser.

use pairscope_core::types::{Trade, TradeRow};
use pairscope_core::{Error, Result};
use std::path::Path;
use tracing::debug;

/// Literal prefix of the trade table header line.
pub const TRADE_TABLE_HEADER: &str = "| Pair | Entry Time |";

/// Minimum number of non-empty cells for a row to be read.
pub const MIN_COLUMNS: usize = 12;

/// Read and parse a report file.
pub fn parse_report(path: &Path) -> Result<Vec<Trade>> {
    let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => {
            Error::MissingInput(format!("report not found: {}", path.display()))
        }
        _ => Error::Io(e),
    })?;
    Ok(parse_trades(&content))
}

/// Extract trades from the first trade table in `content`.
///
/// Rows are read from the line after the header until the next heading or
/// end of input. Rows with fewer than [`MIN_COLUMNS`] cells are skipped.
pub fn parse_trades(content: &str) -> Vec<Trade> {
    let mut lines = content.lines();
    if !lines.any(|line| line.contains(TRADE_TABLE_HEADER)) {
        debug!("No trade table header found");
        return Vec::new();
    }

    let mut trades = Vec::new();
    let mut skipped = 0usize;

    for line in lines {
        if line.trim_start().starts_with('#') {
            break;
        }

        let cells: Vec<&str> = line
            .split('|')
            .map(str::trim)
            .filter(|cell| !cell.is_empty())
            .collect();

        if cells.len() < MIN_COLUMNS || is_separator_row(&cells) {
            if !cells.is_empty() {
                skipped += 1;
            }
            continue;
        }

        trades.push(Trade::from_row(row_from_cells(&cells)));
    }

    debug!(parsed = trades.len(), skipped, "Parsed trade table");
    trades
}

fn is_separator_row(cells: &[&str]) -> bool {
    cells
        .iter()
        .all(|cell| cell.chars().all(|c| matches!(c, '-' | ':' | ' ')))
}

fn row_from_cells(cells: &[&str]) -> TradeRow {
    TradeRow {
        pair: cells[0].to_string(),
        entry_time: cells[1].to_string(),
        exit_time: cells[2].to_string(),
        direction: cells[3].to_string(),
        entry_z: parse_number(cells[4]),
        exit_z: parse_number(cells[5]),
        entry_beta: parse_number(cells[6]),
        exit_beta: parse_number(cells[7]),
        beta_delta: parse_number(cells[8]),
        actual_roi: parse_number(cells[9]),
        predicted_roi: parse_number(cells[10]),
        error_pct: parse_number(cells[11]),
    }
}

/// Parse the leading decimal number of a cell, ignoring trailing text.
///
/// `"+1.25%"` reads as `1.25`, `"0.84x"` as `0.84`. Cells without a leading
/// number (`N/A`, `-`, empty) are `None`.
pub fn parse_number(cell: &str) -> Option<f64> {
    let s = cell.trim();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }

    if digits == 0 {
        return None;
    }

    // Exponent only counts when followed by at least one digit.
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}
