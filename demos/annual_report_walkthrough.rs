use chrono::NaiveDate;
use financial_filing_analyzer::*;
use std::error::Error;
use std::result::Result;

fn date(year: i32, month: u32, day: u32) -> Result<NaiveDate, Box<dyn Error>> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| "invalid date".into())
}

fn annual_filing(
    submitted: NaiveDate,
    revenue: f64,
    net_income: f64,
    total_assets: Option<f64>,
    total_liabilities: f64,
    net_assets: f64,
) -> FilingRecord {
    let mut figures = FinancialFigures::default()
        .with(FinancialField::Revenue, revenue)
        .with(FinancialField::OperatingIncome, revenue * 0.3)
        .with(FinancialField::NetIncome, net_income)
        .with(FinancialField::CurrentAssets, 2_000_000_000_000.0)
        .with(FinancialField::FixedAssets, 600_000_000_000.0)
        .with(FinancialField::CurrentLiabilities, 500_000_000_000.0)
        .with(FinancialField::TotalLiabilities, total_liabilities)
        .with(FinancialField::NetAssets, net_assets);
    figures.set(FinancialField::TotalAssets, total_assets);

    let mut record = FilingRecord::new(submitted, DocumentType::AnnualReport, "通期")
        .with_figures(figures);
    record.company_name = Some("Example Games K.K.".to_string());
    record.security_code = Some("99990".to_string());
    record
}

fn main() -> Result<(), Box<dyn Error>> {
    println!("📂 Building filing history...\n");

    let mut filings = vec![
        annual_filing(
            date(2021, 6, 29)?,
            1_758_910_000_000.0,
            480_376_000_000.0,
            Some(2_646_969_000_000.0),
            -545_000_000_000.0,
            2_101_000_000_000.0,
        ),
        annual_filing(
            date(2022, 6, 28)?,
            1_695_344_000_000.0,
            477_691_000_000.0,
            None,
            610_000_000_000.0,
            2_200_000_000_000.0,
        ),
        annual_filing(
            date(2023, 6, 27)?,
            1_601_677_000_000.0,
            432_768_000_000.0,
            Some(2_854_000_000_000.0),
            600_000_000_000.0,
            -1.0,
        ),
        annual_filing(
            date(2024, 6, 27)?,
            1_671_865_000_000.0,
            490_602_000_000.0,
            Some(3_080_000_000_000.0),
            640_000_000_000.0,
            2_440_000_000_000.0,
        ),
        FilingRecord::new(date(2024, 8, 5)?, DocumentType::QuarterlyReport, "第1四半期"),
        FilingRecord::new(date(2024, 11, 5)?, DocumentType::QuarterlyReport, "第2四半期"),
    ];

    println!("✅ {} filings loaded", filings.len());

    println!("\n🔄 Analyzing (repaired figures)...");
    let analyzer = FilingAnalyzer::new(AnalysisConfig::default())?;
    let report = analyzer.analyze(&mut filings);

    println!("\n📅 Resolved periods:");
    for filing in &filings {
        println!(
            "  {} {:<14} -> {}",
            filing.submission_date,
            filing.document_type.as_str(),
            filing.period_label
        );
    }

    println!("\n🛠️  Corrections:");
    for event in &report.repairs {
        println!(
            "  FY{} {}: {:?} -> {:.0} ({})",
            event.fiscal_year.unwrap_or_default(),
            event.field,
            event.old_value,
            event.new_value,
            event.rule
        );
    }

    println!("\n📊 Ratios:");
    println!("  {:<6} {:>10} {:>10} {:>10} {:>10}", "FY", "Op.margin", "ROA", "ROE", "Growth");
    for row in &report.ratios {
        println!(
            "  {:<6} {:>10} {:>10} {:>10} {:>10}",
            row.fiscal_year,
            fmt_pct(row.operating_margin),
            fmt_pct(row.roa),
            fmt_pct(row.roe),
            fmt_pct(row.growth.revenue)
        );
    }

    if let Some(forecast) = &report.forecast {
        println!("\n📈 Revenue trend (R² {:.3}):", forecast.r_squared);
        for point in &forecast.projections {
            println!("  FY{}: {:.0}", point.fiscal_year, point.value);
        }
    }

    println!("\n🔍 Same filings without repair:");
    let raw = FilingAnalyzer::new(AnalysisConfig {
        ratio_mode: RatioMode::Raw,
        ..AnalysisConfig::default()
    })?
    .analyze(&mut filings);
    for row in &raw.ratios {
        println!("  FY{} ROA {}", row.fiscal_year, fmt_pct(row.roa));
    }

    let output = std::env::temp_dir().join("annual_report_walkthrough.csv");
    write_ratio_csv_to_path(&output, &report.ratio_table(), true)?;
    println!("\n💾 Ratio table written to {}", output.display());

    Ok(())
}

fn fmt_pct(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.1}%", v))
        .unwrap_or_else(|| "n/a".to_string())
}
