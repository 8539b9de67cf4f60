//! Pairscope Core Library
//!
//! Shared types, configuration, and price-source clients for the pairscope
//! analysis tools.

pub mod api;
pub mod config;
pub mod error;
pub mod types;

pub use error::{Error, Result};
