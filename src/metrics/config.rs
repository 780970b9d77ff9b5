//! Engine configuration: overrides, forecast treatment and formula variants

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{ConfigError, ConfigResult};
use super::value::Value;

/// Inclusive range of years
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

impl YearRange {
    pub fn new(start: i32, end: i32) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, year: i32) -> bool {
        self.start <= year && year <= self.end
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.start < 0 || self.end < 0 {
            return Err(ConfigError::NegativeYear { start: self.start, end: self.end });
        }
        if self.start > self.end {
            return Err(ConfigError::InvertedYearRange { start: self.start, end: self.end });
        }
        Ok(())
    }
}

/// Replacement values for one input column
///
/// JSON: `{"sequence": [250, 300]}` or `{"by_year": {"2024": 300}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Override {
    /// Positional values, one per row from the top of the table.
    /// Extra values are ignored; rows past the end keep their own value.
    Sequence(Vec<f64>),
    /// Values keyed by year; years absent from the table are ignored
    ByYear(BTreeMap<i32, f64>),
}

impl Override {
    /// Replacement for the row at `index` with the given year, if any
    pub fn value_for(&self, index: usize, year: Option<i32>) -> Option<f64> {
        match self {
            Override::Sequence(values) => values.get(index).copied(),
            Override::ByYear(by_year) => year.and_then(|y| by_year.get(&y).copied()),
        }
    }

    /// Number of supplied values
    pub fn len(&self) -> usize {
        match self {
            Override::Sequence(values) => values.len(),
            Override::ByYear(by_year) => by_year.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn validate(&self, field: &'static str) -> ConfigResult<()> {
        let bad = match self {
            Override::Sequence(values) => values
                .iter()
                .position(|v| !v.is_finite())
                .map(|i| format!("index {}", i)),
            Override::ByYear(by_year) => by_year
                .iter()
                .find(|(_, v)| !v.is_finite())
                .map(|(year, _)| format!("year {}", year)),
        };
        match bad {
            Some(position) => Err(ConfigError::NonFiniteOverride { field, position }),
            None => Ok(()),
        }
    }
}

/// How a single scalar input adjusts funded CAC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum CacIncreaseMode {
    /// Leave funded CAC untouched
    #[default]
    None,
    /// Replace funded CAC with the amount
    FlatReplace,
    /// Scale funded CAC by `1 + amount / 100`
    PercentageIncrease,
    /// Scale funded CAC by the amount
    Multiplier,
}

/// Funded CAC adjustment over a range of years
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FundedCacIncrease {
    pub mode: CacIncreaseMode,
    pub amount: f64,
    /// Years to adjust; falls back to the forecast range, then to every row
    pub years: Option<YearRange>,
}

impl FundedCacIncrease {
    pub fn new(mode: CacIncreaseMode, amount: f64) -> Self {
        Self { mode, amount, years: None }
    }

    pub fn is_active(&self) -> bool {
        self.mode != CacIncreaseMode::None
    }

    /// Adjusted funded CAC
    pub fn apply(&self, funded_cac: Value) -> Value {
        match self.mode {
            CacIncreaseMode::None => funded_cac,
            CacIncreaseMode::FlatReplace => Value::new(self.amount),
            CacIncreaseMode::PercentageIncrease => {
                let factor = 1.0 + self.amount / 100.0;
                funded_cac.map(|cac| cac * factor)
            }
            CacIncreaseMode::Multiplier => funded_cac.map(|cac| cac * self.amount),
        }
    }

    fn validate(&self) -> ConfigResult<()> {
        if !self.is_active() {
            return Ok(());
        }
        if !self.amount.is_finite() {
            return Err(ConfigError::NonFiniteAmount(self.amount));
        }
        match self.mode {
            CacIncreaseMode::Multiplier if self.amount < 0.0 => {
                Err(ConfigError::NegativeMultiplier(self.amount))
            }
            CacIncreaseMode::PercentageIncrease if self.amount < -100.0 => {
                Err(ConfigError::PercentageBelowFloor(self.amount))
            }
            _ => Ok(()),
        }?;
        match &self.years {
            Some(range) => range.validate(),
            None => Ok(()),
        }
    }
}

fn default_copy_forward() -> bool {
    true
}

/// Forecast years and their anchor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Forecast years (inclusive)
    pub years: YearRange,

    /// Historical year whose ARPU, direct cost and churn rate are copied into
    /// the forecast; defaults to the latest year before `years.start`
    #[serde(default)]
    pub anchor_year: Option<i32>,

    /// Copy per-user economics forward from the anchor year
    #[serde(default = "default_copy_forward")]
    pub copy_forward: bool,
}

impl ForecastConfig {
    pub fn new(years: YearRange) -> Self {
        Self {
            years,
            anchor_year: None,
            copy_forward: true,
        }
    }
}

/// Denominator used for LTV:CAC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum LtvCacBasis {
    /// `ltv / funded_cac`
    #[default]
    PerCustomer,
    /// `ltv / (funded_cac * new_funded_customers)`
    FundedCohort,
}

/// Payback formula orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum PaybackFormula {
    /// `gp_per_active / funded_cac`
    #[default]
    GrossProfitOverCac,
    /// `funded_cac / gp_per_active`
    CacOverGrossProfit,
}

/// Full engine configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Replacement values for `new_customers`
    pub override_new_customers: Option<Override>,

    /// Replacement values for `funded_cac`
    pub override_funded_cac: Option<Override>,

    /// Scalar adjustment of `funded_cac`
    pub funded_cac_increase: FundedCacIncrease,

    /// Forecast range with copy-forward from the anchor year
    pub forecast: Option<ForecastConfig>,

    /// Floor negative payback at zero
    pub payback_clip_negative: bool,

    pub ltv_cac_basis: LtvCacBasis,

    pub payback_formula: PaybackFormula,
}

impl MetricsConfig {
    /// Check everything that does not depend on the table
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(o) = &self.override_new_customers {
            o.validate("new_customers")?;
        }
        if let Some(o) = &self.override_funded_cac {
            o.validate("funded_cac")?;
        }
        if let Some(forecast) = &self.forecast {
            forecast.years.validate()?;
        }
        self.funded_cac_increase.validate()
    }

    /// Years the funded CAC increase applies to; `None` means every row
    pub fn cac_increase_years(&self) -> Option<YearRange> {
        self.funded_cac_increase
            .years
            .or_else(|| self.forecast.as_ref().map(|f| f.years))
    }
}
