//! Asset pairs, aligned price series, and the statistics computed over them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Two assets traded against each other, e.g. `BTC/ETH`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetPair {
    pub asset1: String,
    pub asset2: String,
}

impl AssetPair {
    pub fn new(asset1: impl Into<String>, asset2: impl Into<String>) -> Self {
        Self {
            asset1: asset1.into().to_uppercase(),
            asset2: asset2.into().to_uppercase(),
        }
    }
}

impl fmt::Display for AssetPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.asset1, self.asset2)
    }
}

impl FromStr for AssetPair {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (a, b) = s
            .split_once('/')
            .or_else(|| s.split_once('-'))
            .ok_or_else(|| Error::Config {
                message: format!("invalid pair '{}', expected ASSET1/ASSET2", s),
            })?;
        let (a, b) = (a.trim(), b.trim());
        if a.is_empty() || b.is_empty() {
            return Err(Error::Config {
                message: format!("invalid pair '{}', expected ASSET1/ASSET2", s),
            });
        }
        Ok(Self::new(a, b))
    }
}

/// One daily close.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyClose {
    pub date: NaiveDate,
    pub close: f64,
}

/// Date-aligned close prices for both legs of a pair over a lookback window.
#[derive(Debug, Clone, PartialEq)]
pub struct PairSeries {
    pub pair: AssetPair,
    pub dates: Vec<NaiveDate>,
    pub prices1: Vec<f64>,
    pub prices2: Vec<f64>,
    pub current1: f64,
    pub current2: f64,
    /// Which source(s) supplied the history, e.g. `binance` or `binance+bybit`.
    pub source: String,
}

impl PairSeries {
    pub fn len(&self) -> usize {
        self.prices1.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices1.is_empty()
    }
}

/// Trading stance implied by the current z-score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpreadSignal {
    /// Spread rich: short asset1, long asset2.
    ShortSpread,
    /// Spread cheap: long asset1, short asset2.
    LongSpread,
    /// Close to the mean; existing positions can be taken off.
    ExitZone,
    Neutral,
}

impl SpreadSignal {
    pub const ENTRY_Z: f64 = 2.0;
    pub const EXIT_Z: f64 = 0.5;

    pub fn from_zscore(z: f64) -> Self {
        if z >= Self::ENTRY_Z {
            SpreadSignal::ShortSpread
        } else if z <= -Self::ENTRY_Z {
            SpreadSignal::LongSpread
        } else if z.abs() <= Self::EXIT_Z {
            SpreadSignal::ExitZone
        } else {
            SpreadSignal::Neutral
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SpreadSignal::ShortSpread => "SHORT spread",
            SpreadSignal::LongSpread => "LONG spread",
            SpreadSignal::ExitZone => "exit zone",
            SpreadSignal::Neutral => "neutral",
        }
    }
}

/// Statistics for one pair over one lookback window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairStatistics {
    pub correlation: f64,
    /// Hedge ratio: units of asset2 per unit of asset1.
    pub beta: f64,
    pub current_spread: f64,
    pub mean_spread: f64,
    pub spread_std: f64,
    pub zscore: f64,
    pub mean_reversion_rate: f64,
    pub autocorrelation: f64,
    pub pseudo_adf: f64,
    pub cointegrated: bool,
    /// Estimated half-life in days, when the spread reverts.
    pub half_life: Option<f64>,
    pub signal: SpreadSignal,
    pub data_points: usize,
}
