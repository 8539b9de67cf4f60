//! Configuration management for the pairscope tools.
//!
//! Values are layered: built-in defaults, then an optional `pairscope.toml`
//! (or an explicit file), then `PAIRSCOPE_*` environment variables, e.g.
//! `PAIRSCOPE_SNAPSHOT__PAIR_DELAY_MS=2000`.

use crate::types::AssetPair;
use crate::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub snapshot: SnapshotConfig,
    pub drift: DriftConfig,
    pub history: HistoryConfig,
}

/// Settings for the pair snapshot generator.
#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotConfig {
    /// Pairs in `ASSET1/ASSET2` form.
    pub pairs: Vec<String>,
    /// Lookback windows in days.
    pub timeframes: Vec<usize>,
    /// Pause between pairs to stay under upstream rate limits.
    pub pair_delay_ms: u64,
    pub output_path: String,
    /// Notional of asset1 used for hedge-ratio guidance.
    pub notional: f64,
    pub sources: SourcesConfig,
}

impl SnapshotConfig {
    pub fn asset_pairs(&self) -> Result<Vec<AssetPair>> {
        self.pairs.iter().map(|p| p.parse()).collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourcesConfig {
    pub binance_url: String,
    pub bybit_url: String,
    pub cryptocompare_url: String,
    pub cryptocompare_api_key: Option<String>,
    /// Quote currency appended to every asset symbol.
    pub quote: String,
}

/// Settings for the beta-drift analyzer.
#[derive(Debug, Clone, Deserialize)]
pub struct DriftConfig {
    pub reports_dir: String,
    pub report_prefix: String,
    pub report_suffix: String,
}

/// Settings for the history viewer.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryConfig {
    pub file: String,
    pub recent_limit: usize,
}

impl Config {
    pub const DEFAULT_PAIRS: [&'static str; 4] = ["BTC/ETH", "ETH/SOL", "BTC/SOL", "SOL/AVAX"];
    pub const DEFAULT_TIMEFRAMES: [i64; 3] = [7, 30, 90];

    /// Load configuration from defaults, an optional file, and the environment.
    ///
    /// When `file` is `None`, `pairscope.{toml,json,yaml}` in the working
    /// directory is used if present.
    #[allow(clippy::result_large_err)]
    pub fn load(file: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut builder = config::Config::builder()
            .set_default("snapshot.pairs", Self::DEFAULT_PAIRS.to_vec())?
            .set_default("snapshot.timeframes", Self::DEFAULT_TIMEFRAMES.to_vec())?
            .set_default("snapshot.pair_delay_ms", 1000_i64)?
            .set_default("snapshot.output_path", "pair-snapshot.md")?
            .set_default("snapshot.notional", 1000.0)?
            .set_default("snapshot.sources.binance_url", "https://api.binance.com")?
            .set_default("snapshot.sources.bybit_url", "https://api.bybit.com")?
            .set_default(
                "snapshot.sources.cryptocompare_url",
                "https://min-api.cryptocompare.com",
            )?
            .set_default("snapshot.sources.quote", "USDT")?
            .set_default("drift.reports_dir", "backtest-reports")?
            .set_default("drift.report_prefix", "backtest-")?
            .set_default("drift.report_suffix", ".md")?
            .set_default("history.file", "trade-history.json")?
            .set_default("history.recent_limit", 20_i64)?;

        builder = match file {
            Some(path) => builder.add_source(config::File::from(path).required(true)),
            None => builder.add_source(config::File::with_name("pairscope").required(false)),
        };

        let config: Config = builder
            .add_source(
                config::Environment::with_prefix("PAIRSCOPE")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("snapshot.pairs")
                    .with_list_parse_key("snapshot.timeframes")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the tools cannot run with.
    #[allow(clippy::result_large_err)]
    pub fn validate(&self) -> Result<()> {
        if self.snapshot.pairs.is_empty() {
            return Err(Error::Config {
                message: "snapshot.pairs must not be empty".to_string(),
            });
        }
        self.snapshot.asset_pairs()?;

        if let Some(tf) = self.snapshot.timeframes.iter().find(|&&tf| tf < 3) {
            return Err(Error::Config {
                message: format!("timeframe {} too short, need at least 3 days", tf),
            });
        }
        if self.snapshot.timeframes.is_empty() {
            return Err(Error::Config {
                message: "snapshot.timeframes must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Configuration for testing (defaults, no file, no environment).
    pub fn test_config() -> Self {
        Self {
            snapshot: SnapshotConfig {
                pairs: Self::DEFAULT_PAIRS.iter().map(|s| s.to_string()).collect(),
                timeframes: vec![7, 30],
                pair_delay_ms: 0,
                output_path: "pair-snapshot.md".to_string(),
                notional: 1000.0,
                sources: SourcesConfig {
                    binance_url: "http://127.0.0.1:9".to_string(),
                    bybit_url: "http://127.0.0.1:9".to_string(),
                    cryptocompare_url: "http://127.0.0.1:9".to_string(),
                    cryptocompare_api_key: None,
                    quote: "USDT".to_string(),
                },
            },
            drift: DriftConfig {
                reports_dir: "backtest-reports".to_string(),
                report_prefix: "backtest-".to_string(),
                report_suffix: ".md".to_string(),
            },
            history: HistoryConfig {
                file: "trade-history.json".to_string(),
                recent_limit: 20,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_defaults() {
        let config = Config::load(None).unwrap();
        assert!(!config.snapshot.pairs.is_empty());
        assert!(!config.snapshot.timeframes.is_empty());
        assert_eq!(config.history.recent_limit, 20);
        assert!(config.snapshot.asset_pairs().is_ok());
    }

    #[test]
    fn test_validate_rejects_short_timeframe() {
        let mut config = Config::test_config();
        config.snapshot.timeframes = vec![30, 2];
        assert!(matches!(config.validate(), Err(Error::Config { .. })));
    }

    #[test]
    fn test_validate_rejects_bad_pair() {
        let mut config = Config::test_config();
        config.snapshot.pairs = vec!["BTCETH".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let result = Config::load(Some(Path::new("/nonexistent/pairscope.toml")));
        assert!(matches!(result, Err(Error::ConfigFile(_))));
    }
}
