//! Yearly metrics rows: raw inputs and derived outputs

use serde::{Deserialize, Serialize};

use super::config::YearRange;
use super::value::Value;

/// Column names shared by the loader, the writers and named column lookup
pub mod column {
    pub const YEAR: &str = "Year";
    pub const TOTAL_CUSTOMERS: &str = "Total Customer";
    pub const ACTIVE_RATE: &str = "Active Rate";
    pub const NEW_CUSTOMERS: &str = "New Customer";
    pub const FUNDING_RATE: &str = "Funding Rate";
    pub const ARPU: &str = "ARPU";
    pub const DIRECT_COST: &str = "Direct Cost";
    pub const CHURN_RATE: &str = "Churn Rate";
    pub const FUNDED_CAC: &str = "Funded CAC";

    pub const ACTIVE_CUSTOMERS: &str = "Active Customer";
    pub const INACTIVE_CUSTOMERS: &str = "Inactive Customer";
    pub const NEW_FUNDED_CUSTOMERS: &str = "New Funded Customer";
    pub const GP_PER_ACTIVE: &str = "GP per Active";
    pub const TOTAL_GROSS_PROFIT: &str = "Total Gross Profit";
    pub const LTV: &str = "LTV";
    pub const LTV_CAC_RATIO: &str = "LTV:CAC";
    pub const PAYBACK: &str = "Payback";

    /// Raw input columns in file order (after `Year`)
    pub const INPUTS: [&str; 8] = [
        TOTAL_CUSTOMERS,
        ACTIVE_RATE,
        NEW_CUSTOMERS,
        FUNDING_RATE,
        ARPU,
        DIRECT_COST,
        CHURN_RATE,
        FUNDED_CAC,
    ];

    /// Derived columns in dependency order
    pub const DERIVED: [&str; 8] = [
        ACTIVE_CUSTOMERS,
        INACTIVE_CUSTOMERS,
        NEW_FUNDED_CUSTOMERS,
        GP_PER_ACTIVE,
        TOTAL_GROSS_PROFIT,
        LTV,
        LTV_CAC_RATIO,
        PAYBACK,
    ];
}

/// One year of raw business metrics
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricsRow {
    /// Year key; `None` when the source value could not be coerced
    pub year: Option<i32>,

    /// Total customers on the books
    pub total_customers: Value,

    /// Fraction of customers counted as active
    pub active_rate: Value,

    /// Customers acquired during the year
    pub new_customers: Value,

    /// Fraction of new customers attributed to paid funding
    pub funding_rate: Value,

    /// Average revenue per user
    pub arpu: Value,

    /// Direct cost per user
    pub direct_cost: Value,

    /// Fraction of customers lost per year
    pub churn_rate: Value,

    /// Acquisition cost per funded customer
    pub funded_cac: Value,
}

impl MetricsRow {
    /// Create a fully numeric row
    pub fn new(
        year: i32,
        total_customers: f64,
        active_rate: f64,
        new_customers: f64,
        funding_rate: f64,
        arpu: f64,
        direct_cost: f64,
        churn_rate: f64,
        funded_cac: f64,
    ) -> Self {
        Self {
            year: Some(year),
            total_customers: Value::new(total_customers),
            active_rate: Value::new(active_rate),
            new_customers: Value::new(new_customers),
            funding_rate: Value::new(funding_rate),
            arpu: Value::new(arpu),
            direct_cost: Value::new(direct_cost),
            churn_rate: Value::new(churn_rate),
            funded_cac: Value::new(funded_cac),
        }
    }

    /// Whether the row's year falls inside `range`
    pub fn in_years(&self, range: &YearRange) -> bool {
        self.year.is_some_and(|y| range.contains(y))
    }

    /// Look up a raw input column by name
    pub fn get(&self, name: &str) -> Option<Value> {
        let value = match name {
            column::YEAR => self.year.map(|y| Value::new(y as f64)).unwrap_or(Value::Missing),
            column::TOTAL_CUSTOMERS => self.total_customers,
            column::ACTIVE_RATE => self.active_rate,
            column::NEW_CUSTOMERS => self.new_customers,
            column::FUNDING_RATE => self.funding_rate,
            column::ARPU => self.arpu,
            column::DIRECT_COST => self.direct_cost,
            column::CHURN_RATE => self.churn_rate,
            column::FUNDED_CAC => self.funded_cac,
            _ => return None,
        };
        Some(value)
    }
}

/// Derived unit-economics columns for one row
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DerivedMetrics {
    pub active_customers: Value,
    pub inactive_customers: Value,
    pub new_funded_customers: Value,
    pub gp_per_active: Value,
    pub total_gross_profit: Value,
    pub ltv: Value,
    pub ltv_cac_ratio: Value,
    pub payback: Value,
}

impl DerivedMetrics {
    /// Look up a derived column by name
    pub fn get(&self, name: &str) -> Option<Value> {
        let value = match name {
            column::ACTIVE_CUSTOMERS => self.active_customers,
            column::INACTIVE_CUSTOMERS => self.inactive_customers,
            column::NEW_FUNDED_CUSTOMERS => self.new_funded_customers,
            column::GP_PER_ACTIVE => self.gp_per_active,
            column::TOTAL_GROSS_PROFIT => self.total_gross_profit,
            column::LTV => self.ltv,
            column::LTV_CAC_RATIO => self.ltv_cac_ratio,
            column::PAYBACK => self.payback,
            _ => return None,
        };
        Some(value)
    }

    /// Values in `column::DERIVED` order
    pub fn values(&self) -> [Value; 8] {
        [
            self.active_customers,
            self.inactive_customers,
            self.new_funded_customers,
            self.gp_per_active,
            self.total_gross_profit,
            self.ltv,
            self.ltv_cac_ratio,
            self.payback,
        ]
    }
}

/// Input row (after overrides and copy-forward) paired with its derived columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AugmentedRow {
    #[serde(flatten)]
    pub input: MetricsRow,
    #[serde(flatten)]
    pub derived: DerivedMetrics,
}

impl AugmentedRow {
    pub fn year(&self) -> Option<i32> {
        self.input.year
    }

    /// Look up any input or derived column by name
    pub fn get(&self, name: &str) -> Option<Value> {
        self.input.get(name).or_else(|| self.derived.get(name))
    }

    /// Input values in `column::INPUTS` order
    pub fn input_values(&self) -> [Value; 8] {
        [
            self.input.total_customers,
            self.input.active_rate,
            self.input.new_customers,
            self.input.funding_rate,
            self.input.arpu,
            self.input.direct_cost,
            self.input.churn_rate,
            self.input.funded_cac,
        ]
    }
}
