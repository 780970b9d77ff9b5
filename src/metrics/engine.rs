//! Core metrics engine: input preparation and derived-column calculation

use log::{debug, warn};

use crate::error::{ConfigError, ConfigResult};
use super::config::{LtvCacBasis, MetricsConfig, Override, PaybackFormula};
use super::row::{AugmentedRow, DerivedMetrics, MetricsRow};
use super::table::MetricsTable;
use super::value::Value;

/// Stateless metrics engine
///
/// Each call to [`MetricsEngine::compute`] works on a copy of the caller's
/// table, so repeated calls with the same table give identical results.
#[derive(Debug, Clone, Default)]
pub struct MetricsEngine {
    config: MetricsConfig,
}

impl MetricsEngine {
    /// Create a new engine with the given config
    pub fn new(config: MetricsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }

    /// Compute the augmented table
    ///
    /// Preparation runs in a fixed order: overrides, forecast copy-forward,
    /// funded CAC increase. Derived columns are then calculated row by row.
    pub fn compute(&self, table: &[MetricsRow]) -> ConfigResult<MetricsTable> {
        self.config.validate()?;
        debug!("Computing metrics for {} rows", table.len());

        let mut rows = table.to_vec();
        self.apply_overrides(&mut rows);
        self.copy_forward(&mut rows)?;
        self.apply_cac_increase(&mut rows);

        let augmented = rows
            .into_iter()
            .map(|input| {
                let derived = self.derive(&input);
                AugmentedRow { input, derived }
            })
            .collect();

        Ok(MetricsTable::new(augmented))
    }

    /// Replace `new_customers` and `funded_cac` from caller overrides
    fn apply_overrides(&self, rows: &mut [MetricsRow]) {
        if let Some(o) = &self.config.override_new_customers {
            apply_override(rows, o, "new_customers", |row| &mut row.new_customers);
        }
        if let Some(o) = &self.config.override_funded_cac {
            apply_override(rows, o, "funded_cac", |row| &mut row.funded_cac);
        }
    }

    /// Copy ARPU, direct cost and churn rate from the anchor year into
    /// every forecast row
    fn copy_forward(&self, rows: &mut [MetricsRow]) -> ConfigResult<()> {
        let forecast = match &self.config.forecast {
            Some(f) if f.copy_forward => f,
            _ => return Ok(()),
        };

        let anchor = match forecast.anchor_year {
            Some(year) => rows
                .iter()
                .find(|r| r.year == Some(year))
                .ok_or(ConfigError::AnchorYearNotFound(year))?,
            None => {
                // Latest historical year before the forecast starts
                let latest = rows
                    .iter()
                    .filter(|r| r.year.is_some_and(|y| y < forecast.years.start))
                    .max_by_key(|r| r.year);
                match latest {
                    Some(row) => row,
                    None => {
                        warn!(
                            "No historical year before {}; forecast rows keep their own values",
                            forecast.years.start
                        );
                        return Ok(());
                    }
                }
            }
        };

        let anchor_year = anchor.year;
        let (arpu, direct_cost, churn_rate) = (anchor.arpu, anchor.direct_cost, anchor.churn_rate);

        let mut copied = 0;
        for row in rows.iter_mut().filter(|r| r.in_years(&forecast.years)) {
            row.arpu = arpu;
            row.direct_cost = direct_cost;
            row.churn_rate = churn_rate;
            copied += 1;
        }
        debug!("Copied anchor year {:?} into {} forecast rows", anchor_year, copied);

        Ok(())
    }

    /// Adjust funded CAC over the configured years
    fn apply_cac_increase(&self, rows: &mut [MetricsRow]) {
        let increase = &self.config.funded_cac_increase;
        if !increase.is_active() {
            return;
        }

        let years = self.config.cac_increase_years();
        for row in rows.iter_mut() {
            let in_scope = match &years {
                Some(range) => row.in_years(range),
                None => true,
            };
            if in_scope {
                row.funded_cac = increase.apply(row.funded_cac);
            }
        }
    }

    /// Derived columns for one prepared row, in dependency order
    fn derive(&self, row: &MetricsRow) -> DerivedMetrics {
        let active_customers = row.total_customers * row.active_rate;
        let inactive_customers = row.total_customers - active_customers;
        let new_funded_customers = row.new_customers * row.funding_rate;
        let gp_per_active = row.arpu - row.direct_cost;
        let total_gross_profit = gp_per_active * active_customers;
        let ltv = gp_per_active / row.churn_rate;

        let ltv_cac_ratio = match self.config.ltv_cac_basis {
            LtvCacBasis::PerCustomer => ltv / row.funded_cac,
            LtvCacBasis::FundedCohort => ltv / (row.funded_cac * new_funded_customers),
        };

        let payback = match self.config.payback_formula {
            PaybackFormula::GrossProfitOverCac => gp_per_active / row.funded_cac,
            PaybackFormula::CacOverGrossProfit => row.funded_cac / gp_per_active,
        };
        let payback = if self.config.payback_clip_negative {
            payback.clip_negative()
        } else {
            payback
        };

        DerivedMetrics {
            active_customers,
            inactive_customers,
            new_funded_customers,
            gp_per_active,
            total_gross_profit,
            ltv,
            ltv_cac_ratio,
            payback,
        }
    }
}

fn apply_override(
    rows: &mut [MetricsRow],
    values: &Override,
    field: &str,
    target: impl Fn(&mut MetricsRow) -> &mut Value,
) {
    if let Override::Sequence(seq) = values {
        if seq.len() != rows.len() {
            debug!(
                "Override for {} has {} values for {} rows; applying {}",
                field,
                seq.len(),
                rows.len(),
                seq.len().min(rows.len())
            );
        }
    }

    for (index, row) in rows.iter_mut().enumerate() {
        if let Some(v) = values.value_for(index, row.year) {
            *target(row) = v.into();
        }
    }
}

/// Compute the augmented table for `table` under `config`
pub fn compute(table: &[MetricsRow], config: &MetricsConfig) -> ConfigResult<MetricsTable> {
    MetricsEngine::new(config.clone()).compute(table)
}
