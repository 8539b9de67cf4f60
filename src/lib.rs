//! pairscope: pair-trading analysis tools
//!
//! This is the root crate that provides benchmark and integration-test access
//! to the workspace crates. For actual functionality, use the individual
//! crates directly:
//!
//! - `pairscope-core`: Core types, price-source clients, configuration, errors
//! - `drift-analyzer`: Beta drift versus outcome in backtest reports
//! - `pair-snapshot`: Pair statistics across lookback windows
//! - `history-viewer`: Summary of the live trade history

// Re-export for benchmarks
pub use drift_analyzer as drift;
pub use history_viewer as history;
pub use pair_snapshot as snapshot;
pub use pairscope_core as core;
