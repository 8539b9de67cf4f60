//! Drift Analyzer
//!
//! Studies how hedge-ratio (beta) drift during a trade relates to its outcome.
//!
//! - **Parser**: extracts trades from a markdown backtest report table
//! - **Analyzer**: buckets trades by absolute and percent beta drift
//! - **Renderer**: formats the analysis back into markdown
//! - **Reports**: locates the latest input report and writes the output

pub mod analyzer;
pub mod parser;
pub mod renderer;
pub mod reports;

pub use analyzer::{analyze, BucketStats, DriftAnalysis, DriftRange};
pub use parser::{parse_number, parse_report, parse_trades, TRADE_TABLE_HEADER};
pub use renderer::{render_console_summary, render_markdown};
pub use reports::{find_latest_report, output_file_name, write_report};
