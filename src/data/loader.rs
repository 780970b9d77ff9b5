//! Load yearly metrics from CSV and engine configs from JSON
//!
//! Every cell is read as raw bytes and coerced; anything that is not UTF-8 or
//! does not parse as a number becomes `Value::Missing`. Absent columns load as
//! missing too.

use csv::{ByteRecord, ReaderBuilder, Trim};
use log::{debug, info};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::DataResult;
use crate::metrics::{column, MetricsConfig, MetricsRow, Value};

/// Default dataset location, relative to the working directory
pub const DEFAULT_DATA_PATH: &str = "data.csv";

/// Header position of each known column; `None` when the file lacks it
#[derive(Debug)]
struct ColumnIndex {
    year: Option<usize>,
    inputs: [Option<usize>; 8],
}

fn coerce(raw: Option<&str>) -> Value {
    raw.map(Value::parse).unwrap_or(Value::Missing)
}

/// Years must be whole numbers that fit an `i32`; "2023.0" is accepted
fn coerce_year(raw: Option<&str>) -> Option<i32> {
    let year = coerce(raw).as_f64()?;
    if year.fract() == 0.0 && year >= i32::MIN as f64 && year <= i32::MAX as f64 {
        Some(year as i32)
    } else {
        None
    }
}

impl ColumnIndex {
    /// Match headers by exact (trimmed) name; the first duplicate wins
    fn from_headers(headers: &ByteRecord) -> Self {
        let find = |name: &str| headers.iter().position(|h| h == name.as_bytes());
        Self {
            year: find(column::YEAR),
            inputs: column::INPUTS.map(find),
        }
    }

    fn to_row(&self, record: &ByteRecord) -> MetricsRow {
        let cell = |position: Option<usize>| {
            position
                .and_then(|i| record.get(i))
                .and_then(|bytes| std::str::from_utf8(bytes).ok())
        };
        let [
            total_customers,
            active_rate,
            new_customers,
            funding_rate,
            arpu,
            direct_cost,
            churn_rate,
            funded_cac,
        ] = self.inputs.map(|position| coerce(cell(position)));

        MetricsRow {
            year: coerce_year(cell(self.year)),
            total_customers,
            active_rate,
            new_customers,
            funding_rate,
            arpu,
            direct_cost,
            churn_rate,
            funded_cac,
        }
    }
}

/// Load all rows from a CSV file
pub fn load_metrics<P: AsRef<Path>>(path: P) -> DataResult<Vec<MetricsRow>> {
    let path = path.as_ref();
    info!("Loading metrics from {}", path.display());
    load_metrics_from_reader(File::open(path)?)
}

/// Load rows from any reader (e.g., string buffer, upload stream)
pub fn load_metrics_from_reader<R: Read>(reader: R) -> DataResult<Vec<MetricsRow>> {
    let mut csv_reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);
    let index = ColumnIndex::from_headers(csv_reader.byte_headers()?);
    debug!("Column positions: {:?}", index);
    let mut rows = Vec::new();

    for result in csv_reader.byte_records() {
        rows.push(index.to_row(&result?));
    }

    debug!("Loaded {} metrics rows", rows.len());
    Ok(rows)
}

/// Load rows from the default data.csv location
pub fn load_default_metrics() -> DataResult<Vec<MetricsRow>> {
    load_metrics(DEFAULT_DATA_PATH)
}

/// Load an engine config from a JSON file
pub fn load_config<P: AsRef<Path>>(path: P) -> DataResult<MetricsConfig> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(file)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{CacIncreaseMode, YearRange};

    #[test]
    fn test_load_sample_metrics() {
        let rows = load_metrics("data/sample_metrics.csv").expect("Failed to load sample metrics");
        assert_eq!(rows.len(), 7);

        let first = &rows[0];
        assert_eq!(first.year, Some(2019));
        assert_eq!(first.total_customers, Value::Number(420.0));
        assert_eq!(first.funded_cac, Value::Number(360.0));

        // Forecast years leave per-user economics blank
        let y2024 = &rows[5];
        assert_eq!(y2024.year, Some(2024));
        assert_eq!(y2024.arpu, Value::Missing);
        assert_eq!(y2024.churn_rate, Value::Missing);
        assert_eq!(y2024.funded_cac, Value::Number(520.0));

        let y2025 = &rows[6];
        assert_eq!(y2025.arpu, Value::Missing);
        assert_eq!(y2025.churn_rate, Value::Number(0.0));
    }

    #[test]
    fn test_non_numeric_cells_are_missing() {
        let data = "\
Year,Total Customer,Active Rate,New Customer,Funding Rate,ARPU,Direct Cost,Churn Rate,Funded CAC
2023.0, 1000 ,0.8,abc,0.5,100,40,0.1,500
twenty,1,1,1,1,1,1,1,1
";
        let rows = load_metrics_from_reader(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].year, Some(2023));
        assert_eq!(rows[0].total_customers, Value::Number(1000.0));
        assert_eq!(rows[0].new_customers, Value::Missing);
        assert_eq!(rows[1].year, None);
    }

    #[test]
    fn test_absent_columns_load_as_missing() {
        let data = "Year,ARPU,Direct Cost,Notes\n2023,100,40,launch year\n";
        let rows = load_metrics_from_reader(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].arpu, Value::Number(100.0));
        assert_eq!(rows[0].churn_rate, Value::Missing);
        assert_eq!(rows[0].funded_cac, Value::Missing);
    }

    #[test]
    fn test_short_records_pad_with_missing() {
        let data = "Year,Total Customer,Active Rate\n2023,1000\n";
        let rows = load_metrics_from_reader(data.as_bytes()).unwrap();
        assert_eq!(rows[0].total_customers, Value::Number(1000.0));
        assert_eq!(rows[0].active_rate, Value::Missing);
    }

    #[test]
    fn test_undecodable_cell_is_missing() {
        let data: &[u8] = b"Year,Total Customer,Active Rate\n2023,1000,\xFF\xFE\n2024,1100,0.9\n";
        let rows = load_metrics_from_reader(data).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].year, Some(2023));
        assert_eq!(rows[0].total_customers, Value::Number(1000.0));
        assert_eq!(rows[0].active_rate, Value::Missing);
        assert_eq!(rows[1].year, Some(2024));
        assert_eq!(rows[1].active_rate, Value::Number(0.9));
    }

    #[test]
    fn test_columns_matched_by_header_not_order() {
        let data = " Funded CAC , Year ,ARPU\n500,2023,100\n";
        let rows = load_metrics_from_reader(data.as_bytes()).unwrap();
        assert_eq!(rows[0].year, Some(2023));
        assert_eq!(rows[0].funded_cac, Value::Number(500.0));
        assert_eq!(rows[0].arpu, Value::Number(100.0));
        assert_eq!(rows[0].total_customers, Value::Missing);
    }

    #[test]
    fn test_load_sample_config() {
        let config =
            load_config("data/sample_scenario.json").expect("Failed to load sample config");
        let forecast = config.forecast.as_ref().expect("forecast range");
        assert_eq!(forecast.years, YearRange::new(2024, 2025));
        assert_eq!(config.funded_cac_increase.mode, CacIncreaseMode::PercentageIncrease);
        assert!(config.payback_clip_negative);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(load_metrics("data/does_not_exist.csv").is_err());
    }
}
