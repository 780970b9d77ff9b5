//! Unit Economics CLI
//!
//! Loads a yearly metrics CSV, applies the engine config and prints the
//! derived unit-economics table.
//!
//! Usage:
//!   unit-economics --input data.csv
//!   unit-economics --input data.csv --forecast-start 2024 --forecast-end 2026 \
//!       --cac-mode percentage-increase --cac-amount 15 --output metrics.csv
//!   unit-economics --config scenario.json --json

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;

use unit_economics::data::{load_config, load_metrics, loader::DEFAULT_DATA_PATH};
use unit_economics::metrics::{
    AugmentedRow, CacIncreaseMode, ForecastConfig, LtvCacBasis, MetricsConfig, MetricsEngine,
    MetricsSummary, MetricsTable, PaybackFormula, YearRange,
};

#[derive(Parser, Debug)]
#[command(
    name = "unit-economics",
    version,
    about = "LTV, CAC, LTV:CAC and payback from yearly metrics"
)]
struct Args {
    /// Metrics CSV (Year, Total Customer, Active Rate, ...)
    #[arg(short, long, default_value = DEFAULT_DATA_PATH)]
    input: PathBuf,

    /// JSON engine config; flags below override its fields
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the augmented table to this CSV file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print rows and summary as JSON instead of a text table
    #[arg(long)]
    json: bool,

    /// Floor negative payback at zero
    #[arg(long)]
    clip_negative_payback: bool,

    /// First forecast year (inclusive)
    #[arg(long, requires = "forecast_end")]
    forecast_start: Option<i32>,

    /// Last forecast year (inclusive)
    #[arg(long, requires = "forecast_start")]
    forecast_end: Option<i32>,

    /// Historical year copied into the forecast (default: latest before the forecast)
    #[arg(long)]
    anchor_year: Option<i32>,

    /// How --cac-amount adjusts funded CAC
    #[arg(long, value_enum)]
    cac_mode: Option<CacIncreaseMode>,

    /// Amount for --cac-mode (value, percent or factor)
    #[arg(long)]
    cac_amount: Option<f64>,

    #[arg(long, value_enum)]
    ltv_cac_basis: Option<LtvCacBasis>,

    #[arg(long, value_enum)]
    payback_formula: Option<PaybackFormula>,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    rows: &'a [AugmentedRow],
    summary: MetricsSummary,
}

fn build_config(args: &Args) -> Result<MetricsConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => MetricsConfig::default(),
    };

    if args.clip_negative_payback {
        config.payback_clip_negative = true;
    }
    if let (Some(start), Some(end)) = (args.forecast_start, args.forecast_end) {
        let years = YearRange::new(start, end);
        config
            .forecast
            .get_or_insert_with(|| ForecastConfig::new(years))
            .years = years;
    }
    if let Some(year) = args.anchor_year {
        match config.forecast.as_mut() {
            Some(forecast) => forecast.anchor_year = Some(year),
            None => bail!("--anchor-year requires a forecast range"),
        }
    }
    if let Some(mode) = args.cac_mode {
        config.funded_cac_increase.mode = mode;
    }
    if let Some(amount) = args.cac_amount {
        if config.funded_cac_increase.mode == CacIncreaseMode::None {
            bail!("--cac-amount has no effect without --cac-mode or a mode in the config");
        }
        config.funded_cac_increase.amount = amount;
    }
    if let Some(basis) = args.ltv_cac_basis {
        config.ltv_cac_basis = basis;
    }
    if let Some(formula) = args.payback_formula {
        config.payback_formula = formula;
    }

    Ok(config)
}

fn print_table(table: &MetricsTable) {
    println!(
        "{:>6} {:>12} {:>12} {:>10} {:>16} {:>12} {:>9} {:>9}",
        "Year", "Active", "New Funded", "GP/Active", "Total GP", "LTV", "LTV:CAC", "Payback"
    );
    println!("{}", "-".repeat(93));

    for row in table.rows() {
        let year = row.year().map(|y| y.to_string()).unwrap_or_default();
        let d = &row.derived;
        println!(
            "{:>6} {:>12.1} {:>12.1} {:>10.2} {:>16.2} {:>12.2} {:>9.3} {:>9.3}",
            year,
            d.active_customers,
            d.new_funded_customers,
            d.gp_per_active,
            d.total_gross_profit,
            d.ltv,
            d.ltv_cac_ratio,
            d.payback,
        );
    }
}

fn print_summary(summary: &MetricsSummary) {
    println!("\nSummary:");
    println!("  Rows: {}", summary.rows);
    if let (Some(first), Some(last)) = (summary.first_year, summary.last_year) {
        println!("  Years: {}-{}", first, last);
    }
    println!("  Latest LTV: {:.2}", summary.latest_ltv);
    println!("  Latest LTV:CAC: {:.3}", summary.latest_ltv_cac_ratio);
    println!("  Latest Payback: {:.3}", summary.latest_payback);
    println!("  Mean LTV:CAC: {:.3}", summary.mean_ltv_cac_ratio);
    println!("  Total Gross Profit: {:.2}", summary.total_gross_profit);
    if summary.rows_without_ratio > 0 {
        println!("  Rows without LTV:CAC: {}", summary.rows_without_ratio);
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let config = build_config(&args)?;

    let rows = load_metrics(&args.input)
        .with_context(|| format!("Failed to load metrics from {}", args.input.display()))?;

    let engine = MetricsEngine::new(config);
    let table = engine.compute(&rows).context("Invalid metrics configuration")?;
    let summary = table.summary();

    if args.json {
        let report = JsonReport { rows: table.rows(), summary };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Unit Economics");
        println!("==============\n");
        println!("Input: {} ({} rows)\n", args.input.display(), rows.len());
        print_table(&table);
        print_summary(&summary);
    }

    if let Some(path) = &args.output {
        table
            .write_csv_path(path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        if !args.json {
            println!("\nFull results written to: {}", path.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(flags: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("unit-economics").chain(flags.iter().copied()))
            .expect("valid arguments")
    }

    #[test]
    fn test_defaults_without_flags() {
        let config = build_config(&args(&[])).unwrap();
        assert_eq!(config, MetricsConfig::default());
    }

    #[test]
    fn test_forecast_flags_insert_range() {
        let config =
            build_config(&args(&["--forecast-start", "2024", "--forecast-end", "2026"])).unwrap();
        let forecast = config.forecast.expect("forecast range");
        assert_eq!(forecast.years, YearRange::new(2024, 2026));
        assert_eq!(forecast.anchor_year, None);
        assert!(forecast.copy_forward);
    }

    #[test]
    fn test_forecast_flags_keep_config_anchor() {
        let path = std::env::temp_dir().join(format!("unit_economics_{}.json", std::process::id()));
        let json = r#"{
            "forecast": {
                "years": {"start": 2024, "end": 2025},
                "anchor_year": 2021,
                "copy_forward": false
            }
        }"#;
        std::fs::write(&path, json).unwrap();

        let path_arg = path.to_string_lossy().into_owned();
        let result = build_config(&args(&[
            "--config",
            path_arg.as_str(),
            "--forecast-start",
            "2026",
            "--forecast-end",
            "2027",
        ]));
        std::fs::remove_file(&path).unwrap();

        let forecast = result.unwrap().forecast.expect("forecast range");
        assert_eq!(forecast.years, YearRange::new(2026, 2027));
        assert_eq!(forecast.anchor_year, Some(2021));
        assert!(!forecast.copy_forward);
    }

    #[test]
    fn test_anchor_year_requires_forecast() {
        assert!(build_config(&args(&["--anchor-year", "2023"])).is_err());

        let config = build_config(&args(&[
            "--forecast-start",
            "2024",
            "--forecast-end",
            "2025",
            "--anchor-year",
            "2022",
        ]))
        .unwrap();
        assert_eq!(config.forecast.unwrap().anchor_year, Some(2022));
    }

    #[test]
    fn test_forecast_start_requires_end() {
        let result = Args::try_parse_from(["unit-economics", "--forecast-start", "2024"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_flags_override_config_file() {
        let config = build_config(&args(&[
            "--config",
            "data/sample_scenario.json",
            "--cac-mode",
            "multiplier",
            "--cac-amount",
            "1.5",
            "--ltv-cac-basis",
            "funded-cohort",
            "--payback-formula",
            "cac-over-gross-profit",
        ]))
        .unwrap();

        assert_eq!(config.funded_cac_increase.mode, CacIncreaseMode::Multiplier);
        assert_eq!(config.funded_cac_increase.amount, 1.5);
        assert_eq!(config.ltv_cac_basis, LtvCacBasis::FundedCohort);
        assert_eq!(config.payback_formula, PaybackFormula::CacOverGrossProfit);
        // Fields without a flag come from the file
        assert!(config.payback_clip_negative);
        assert!(config.override_new_customers.is_some());
        assert_eq!(config.forecast.unwrap().years, YearRange::new(2024, 2025));
    }

    #[test]
    fn test_cac_amount_uses_config_mode() {
        let config = build_config(&args(&[
            "--config",
            "data/sample_scenario.json",
            "--cac-amount",
            "20",
        ]))
        .unwrap();
        assert_eq!(config.funded_cac_increase.mode, CacIncreaseMode::PercentageIncrease);
        assert_eq!(config.funded_cac_increase.amount, 20.0);
    }

    #[test]
    fn test_cac_amount_without_mode_is_error() {
        assert!(build_config(&args(&["--cac-amount", "15"])).is_err());
        assert!(build_config(&args(&["--cac-mode", "none", "--cac-amount", "15"])).is_err());
    }

    #[test]
    fn test_missing_config_file_is_error() {
        assert!(build_config(&args(&["--config", "data/does_not_exist.json"])).is_err());
    }
}
