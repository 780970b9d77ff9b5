//! Augmented metrics table: named columns, summary statistics and writers

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

use crate::error::DataResult;
use super::row::{column, AugmentedRow};
use super::value::Value;

/// Engine output, one row per input row in input order
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricsTable {
    rows: Vec<AugmentedRow>,
}

impl MetricsTable {
    pub fn new(rows: Vec<AugmentedRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[AugmentedRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<AugmentedRow> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Every column name, in output order
    pub fn column_names() -> Vec<&'static str> {
        std::iter::once(column::YEAR)
            .chain(column::INPUTS)
            .chain(column::DERIVED)
            .collect()
    }

    /// `(year, value)` series for a named column, or `None` for an unknown name
    pub fn column(&self, name: &str) -> Option<Vec<(Option<i32>, Value)>> {
        if !Self::column_names().iter().any(|c| *c == name) {
            return None;
        }
        self.rows
            .iter()
            .map(|row| row.get(name).map(|v| (row.year(), v)))
            .collect()
    }

    /// Row with the greatest year; falls back to the last row when no year parsed
    pub fn latest(&self) -> Option<&AugmentedRow> {
        self.rows
            .iter()
            .filter(|r| r.year().is_some())
            .max_by_key(|r| r.year())
            .or_else(|| self.rows.last())
    }

    /// Get summary statistics
    pub fn summary(&self) -> MetricsSummary {
        let years: Vec<i32> = self.rows.iter().filter_map(|r| r.year()).collect();

        let ratios: Vec<f64> = self
            .rows
            .iter()
            .filter_map(|r| r.derived.ltv_cac_ratio.as_f64())
            .collect();
        let mean_ltv_cac_ratio = if ratios.is_empty() {
            Value::Missing
        } else {
            Value::new(ratios.iter().sum::<f64>() / ratios.len() as f64)
        };

        let profits: Vec<f64> = self
            .rows
            .iter()
            .filter_map(|r| r.derived.total_gross_profit.as_f64())
            .collect();
        let total_gross_profit = if profits.is_empty() {
            Value::Missing
        } else {
            Value::new(profits.iter().sum())
        };

        let latest = self.latest();
        let pick = |f: fn(&AugmentedRow) -> Value| latest.map(f).unwrap_or_default();

        MetricsSummary {
            rows: self.rows.len(),
            first_year: years.iter().min().copied(),
            last_year: years.iter().max().copied(),
            latest_ltv: pick(|r| r.derived.ltv),
            latest_ltv_cac_ratio: pick(|r| r.derived.ltv_cac_ratio),
            latest_payback: pick(|r| r.derived.payback),
            mean_ltv_cac_ratio,
            total_gross_profit,
            rows_without_ratio: self.rows.len() - ratios.len(),
        }
    }

    /// Write the table as CSV; undefined cells read `N/A`, missing cells are empty
    pub fn write_csv<W: Write>(&self, writer: W) -> DataResult<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(Self::column_names())?;

        for row in &self.rows {
            let year = row.year().map(|y| y.to_string()).unwrap_or_default();
            let record = std::iter::once(year).chain(
                row.input_values()
                    .into_iter()
                    .chain(row.derived.values())
                    .map(|v| v.to_string()),
            );
            csv_writer.write_record(record)?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Write the table as CSV to a file
    pub fn write_csv_path<P: AsRef<Path>>(&self, path: P) -> DataResult<()> {
        let file = std::fs::File::create(path)?;
        self.write_csv(file)
    }

    /// Pretty-printed JSON array of rows
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.rows)
    }
}

/// Summary statistics for a metrics table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub rows: usize,
    pub first_year: Option<i32>,
    pub last_year: Option<i32>,
    pub latest_ltv: Value,
    pub latest_ltv_cac_ratio: Value,
    pub latest_payback: Value,
    /// Mean over rows with a numeric ratio
    pub mean_ltv_cac_ratio: Value,
    /// Sum over rows with a numeric gross profit
    pub total_gross_profit: Value,
    /// Rows whose LTV:CAC is missing or undefined
    pub rows_without_ratio: usize,
}
