//! Error types for annotation storage operations

mod builders;
mod conversions;
mod display;
mod types;

pub use types::{Error, Result};
