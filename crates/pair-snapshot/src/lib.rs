//! Pair Snapshot
//!
//! Fetches daily closes for configured asset pairs through a chain of
//! fallback price sources and computes pair-trading statistics per lookback
//! window.
//!
//! # Example
//!
//! ```ignore
//! use pair_snapshot::{PriceFetcher, compute_pair_statistics};
//!
//! let fetcher = PriceFetcher::from_config(&config.snapshot.sources)?;
//! let series = fetcher.fetch_pair(&"BTC/ETH".parse()?, 30).await?;
//! let stats = compute_pair_statistics(&series)?;
//! println!("beta {:.4}, z {:.2}", stats.beta, stats.zscore);
//! ```

pub mod fetcher;
pub mod report;
pub mod snapshot;
pub mod statistics;

pub use fetcher::{align_by_date, PriceFetcher};
pub use report::{render_console_summary, render_snapshot};
pub use snapshot::{run_snapshot, PairSnapshot, TimeframeResult};
pub use statistics::compute_pair_statistics;
