//! Core domain types for the pairscope tools.

pub mod history;
pub mod pair;
pub mod trade;

pub use history::*;
pub use pair::*;
pub use trade::*;
