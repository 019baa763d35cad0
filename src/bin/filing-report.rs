//! Reads an EDINET filing export, prints the latest-year summary and writes
//! the annual ratio table.
//!
//! Usage:
//!   filing-report nintendo_.csv
//!   filing-report nintendo_.csv --output ratios.csv --json report.json
//!   filing-report nintendo_.csv --raw --horizon 3
//!   RUST_LOG=debug filing-report nintendo_.csv       # show repair details

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use financial_filing_analyzer::{
    write_json_to_path, write_ratio_csv_to_path, AnalysisConfig, AnalysisReport, FilingAnalyzer,
    RatioMode,
};

#[derive(Parser)]
#[command(name = "filing-report")]
#[command(about = "Reconcile regulatory filings and derive annual financial ratios")]
struct Args {
    /// Filing export (CSV with EDINET or English headers)
    input: PathBuf,

    /// Where to write the annual ratio table
    #[arg(short = 'o', long, default_value = "financial_ratios.csv")]
    output: PathBuf,

    /// Also write the full report as JSON
    #[arg(short = 'j', long)]
    json: Option<PathBuf>,

    /// Analysis config (JSON); defaults apply to anything it leaves out
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Compute ratios on the filings as read, skipping repair
    #[arg(long)]
    raw: bool,

    /// Number of fiscal years to project revenue forward
    #[arg(long)]
    horizon: Option<usize>,

    /// Print the analysis config JSON schema and exit
    #[arg(long)]
    print_config_schema: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.print_config_schema {
        println!("{}", AnalysisConfig::schema_as_json()?);
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => AnalysisConfig::from_json_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => AnalysisConfig::default(),
    };
    if args.raw {
        config.ratio_mode = RatioMode::Raw;
    }
    if let Some(horizon) = args.horizon {
        config.forecast_horizon = horizon;
    }

    let analyzer = FilingAnalyzer::new(config)?;
    let (_, report) = analyzer
        .analyze_path(&args.input)
        .with_context(|| format!("analyzing {}", args.input.display()))?;

    print_summary(&report);

    write_ratio_csv_to_path(&args.output, &report.ratio_table(), analyzer.config().csv_bom)
        .with_context(|| format!("writing {}", args.output.display()))?;
    println!("\nRatio table written to {}", args.output.display());

    if let Some(path) = &args.json {
        write_json_to_path(path, &report)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("Report written to {}", path.display());
    }

    Ok(())
}

fn print_summary(report: &AnalysisReport) {
    let company = report.company_name.as_deref().unwrap_or("(unknown company)");
    match &report.security_code {
        Some(code) => println!("{} [{}]", company, code),
        None => println!("{}", company),
    }
    println!(
        "{} filings read, {} periods resolved, {} annual years, {} corrections ({:?} mode)",
        report.filings_read,
        report.periods_resolved,
        report.ratios.len(),
        report.repairs.len(),
        report.mode
    );

    let Some(summary) = &report.summary else {
        println!("No annual filings to summarize.");
        return;
    };

    println!("\n=== Fiscal year {} ===", summary.fiscal_year);
    print_amount("Revenue", summary.revenue);
    print_amount("Operating income", summary.operating_income);
    print_amount("Net income", summary.net_income);
    print_amount("Total assets", summary.total_assets);
    print_amount("Net assets", summary.net_assets);
    print_percent("Operating margin", summary.operating_margin);
    print_percent("ROA", summary.roa);
    print_percent("ROE", summary.roe);
    print_percent("Current ratio", summary.current_ratio);
    print_percent("Equity ratio", summary.equity_ratio_pct);
    print_percent("Revenue growth", summary.revenue_growth);
    print_percent("Net income growth", summary.net_income_growth);

    if let Some(forecast) = &report.forecast {
        println!(
            "\nRevenue trend: {:.0} per year (R² {:.3}, RMSE {:.0})",
            forecast.trend.slope, forecast.r_squared, forecast.rmse
        );
        for point in &forecast.projections {
            println!("  {}: {:.0}", point.fiscal_year, point.value);
        }
    }
}

fn print_amount(label: &str, value: Option<f64>) {
    match value {
        Some(v) => println!("  {:<18} {:>20.0}", label, v),
        None => println!("  {:<18} {:>20}", label, "n/a"),
    }
}

fn print_percent(label: &str, value: Option<f64>) {
    match value {
        Some(v) => println!("  {:<18} {:>19.2}%", label, v),
        None => println!("  {:<18} {:>20}", label, "n/a"),
    }
}
