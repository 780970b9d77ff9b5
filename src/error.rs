//! Error types for configuration and data loading
//!
//! Data anomalies (unparsable cells, zero divisors) are never errors; they
//! become `Value::Missing` / `Value::Undefined`. Only a configuration the
//! engine cannot honour, or a file it cannot read, surfaces here.

use thiserror::Error;

/// Invalid engine configuration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid year range {start}..={end}: start is after end")]
    InvertedYearRange { start: i32, end: i32 },

    #[error("Invalid year range {start}..={end}: years must be non-negative")]
    NegativeYear { start: i32, end: i32 },

    #[error("Override for '{field}' has a non-finite value at {position}")]
    NonFiniteOverride { field: &'static str, position: String },

    #[error("Funded CAC increase amount must be finite, got {0}")]
    NonFiniteAmount(f64),

    #[error("Funded CAC multiplier must be non-negative, got {0}")]
    NegativeMultiplier(f64),

    #[error("Funded CAC percentage increase must be at least -100, got {0}")]
    PercentageBelowFloor(f64),

    #[error("Anchor year {0} is not present in the table")]
    AnchorYearNotFound(i32),
}

/// Failure reading or writing a dataset or configuration file
#[derive(Error, Debug)]
pub enum DataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
pub type DataResult<T> = Result<T, DataError>;
