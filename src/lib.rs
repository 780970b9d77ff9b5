//! Unit Economics - metrics engine for yearly SaaS business data
//!
//! This library provides:
//! - CSV loading with lenient numeric coercion
//! - A configurable engine deriving LTV, LTV:CAC, payback and gross profit
//! - Per-year overrides, forecast copy-forward and funded CAC adjustments
//! - Multi-scenario evaluation over a single loaded dataset

pub mod error;
pub mod metrics;
pub mod data;
pub mod scenario;

// Re-export commonly used types
pub use error::{ConfigError, DataError};
pub use metrics::{compute, MetricsConfig, MetricsEngine, MetricsRow, MetricsTable, Value};
pub use scenario::ScenarioRunner;
