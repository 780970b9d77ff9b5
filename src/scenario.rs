//! Scenario runner for repeated recomputation
//!
//! Loads a dataset once, then evaluates any number of configurations against
//! it. Every run starts from the originally loaded rows.

use rayon::prelude::*;
use std::path::Path;

use crate::data::load_metrics;
use crate::error::{ConfigResult, DataResult};
use crate::metrics::{MetricsConfig, MetricsEngine, MetricsRow, MetricsTable};

/// Pre-loaded dataset for scenario evaluation
///
/// # Example
/// ```ignore
/// let runner = ScenarioRunner::from_csv("data.csv")?;
///
/// for pct in [0.0, 10.0, 25.0] {
///     let config = MetricsConfig { ... };
///     let table = runner.run(&config)?;
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScenarioRunner {
    base_table: Vec<MetricsRow>,
}

impl ScenarioRunner {
    pub fn new(base_table: Vec<MetricsRow>) -> Self {
        Self { base_table }
    }

    /// Create runner by loading a CSV dataset
    pub fn from_csv<P: AsRef<Path>>(path: P) -> DataResult<Self> {
        Ok(Self::new(load_metrics(path)?))
    }

    /// Run a single config against the original rows
    pub fn run(&self, config: &MetricsConfig) -> ConfigResult<MetricsTable> {
        MetricsEngine::new(config.clone()).compute(&self.base_table)
    }

    /// Run several configs in parallel; results keep the order of `configs`
    pub fn run_scenarios(&self, configs: &[MetricsConfig]) -> Vec<ConfigResult<MetricsTable>> {
        configs.par_iter().map(|config| self.run(config)).collect()
    }

    /// Get reference to the loaded rows
    pub fn table(&self) -> &[MetricsRow] {
        &self.base_table
    }
}
