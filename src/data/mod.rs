//! Dataset and configuration loading

pub mod loader;

pub use loader::{load_config, load_default_metrics, load_metrics, load_metrics_from_reader};
