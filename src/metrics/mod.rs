//! Unit-economics metrics: value type, row model, configuration and engine

mod value;
mod row;
mod config;
mod engine;
mod table;

pub use value::{Value, UNDEFINED_LABEL};
pub use row::{column, AugmentedRow, DerivedMetrics, MetricsRow};
pub use config::{
    CacIncreaseMode, ForecastConfig, FundedCacIncrease, LtvCacBasis, MetricsConfig, Override,
    PaybackFormula, YearRange,
};
pub use engine::{compute, MetricsEngine};
pub use table::{MetricsSummary, MetricsTable};
