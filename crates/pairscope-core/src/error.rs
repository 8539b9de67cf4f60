//! Error types for the pairscope tools.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration file error: {0}")]
    ConfigFile(#[from] config::ConfigError),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("API error: {message}")]
    Api { message: String, status: Option<u16> },

    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("Insufficient data for {pair}: needed {needed} points, got {got}")]
    InsufficientData {
        pair: String,
        needed: usize,
        got: usize,
    },

    #[error("Degenerate series: {0}")]
    DegenerateSeries(String),
}

impl Error {
    /// Shorthand for an API error without an HTTP status.
    pub fn api(message: impl Into<String>) -> Self {
        Error::Api {
            message: message.into(),
            status: None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
