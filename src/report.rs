use crate::error::Result;
use crate::forecast::RevenueForecast;
use crate::ratios::{RatioMode, RatioRow, RatioTable};
use crate::repair::RepairEvent;
use chrono::NaiveDate;
use log::info;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Key figures of the most recent fiscal year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LatestYearSummary {
    pub fiscal_year: i32,
    pub revenue: Option<f64>,
    pub operating_income: Option<f64>,
    pub net_income: Option<f64>,
    pub total_assets: Option<f64>,
    pub net_assets: Option<f64>,
    pub operating_margin: Option<f64>,
    pub roa: Option<f64>,
    pub roe: Option<f64>,
    pub current_ratio: Option<f64>,
    pub equity_ratio_pct: Option<f64>,
    pub revenue_growth: Option<f64>,
    pub net_income_growth: Option<f64>,
}

impl LatestYearSummary {
    pub fn from_table(table: &RatioTable) -> Option<Self> {
        table.latest().map(Self::from_row)
    }

    pub fn from_row(row: &RatioRow) -> Self {
        Self {
            fiscal_year: row.fiscal_year,
            revenue: row.figures.revenue,
            operating_income: row.figures.operating_income,
            net_income: row.figures.net_income,
            total_assets: row.figures.total_assets,
            net_assets: row.figures.net_assets,
            operating_margin: row.operating_margin,
            roa: row.roa,
            roe: row.roe,
            current_ratio: row.current_ratio,
            equity_ratio_pct: row.equity_ratio_pct,
            revenue_growth: row.growth.revenue,
            net_income_growth: row.growth.net_income,
        }
    }
}

/// Everything one run produces, in a form that serializes to a single JSON
/// document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisReport {
    pub company_name: Option<String>,
    pub security_code: Option<String>,
    pub filings_read: usize,
    pub periods_resolved: usize,
    pub mode: RatioMode,
    pub ratios: Vec<RatioRow>,
    pub repairs: Vec<RepairEvent>,
    pub forecast: Option<RevenueForecast>,
    pub summary: Option<LatestYearSummary>,
}

impl AnalysisReport {
    pub fn ratio_table(&self) -> RatioTable {
        RatioTable {
            mode: self.mode,
            rows: self.ratios.clone(),
        }
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(AnalysisReport)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

/// Flat CSV row. The csv serializer cannot flatten nested structs, so the
/// figures and ratios are spelled out column by column.
#[derive(Debug, Serialize)]
struct RatioCsvRow<'a> {
    fiscal_year: i32,
    period_label: &'a str,
    submission_date: NaiveDate,
    revenue: Option<f64>,
    gross_profit: Option<f64>,
    operating_income: Option<f64>,
    ordinary_income: Option<f64>,
    pretax_income: Option<f64>,
    net_income: Option<f64>,
    earnings_per_share: Option<f64>,
    total_assets: Option<f64>,
    current_assets: Option<f64>,
    fixed_assets: Option<f64>,
    total_liabilities: Option<f64>,
    current_liabilities: Option<f64>,
    fixed_liabilities: Option<f64>,
    net_assets: Option<f64>,
    capital: Option<f64>,
    retained_earnings: Option<f64>,
    operating_cash_flow: Option<f64>,
    investing_cash_flow: Option<f64>,
    financing_cash_flow: Option<f64>,
    cash_equivalents: Option<f64>,
    book_value_per_share: Option<f64>,
    equity_ratio: Option<f64>,
    dividend: Option<f64>,
    operating_margin: Option<f64>,
    net_margin: Option<f64>,
    gross_margin: Option<f64>,
    ordinary_margin: Option<f64>,
    roa: Option<f64>,
    roe: Option<f64>,
    asset_turnover: Option<f64>,
    fixed_asset_turnover: Option<f64>,
    net_assets_turnover: Option<f64>,
    current_ratio: Option<f64>,
    fixed_ratio: Option<f64>,
    debt_ratio: Option<f64>,
    equity_ratio_pct: Option<f64>,
    working_capital: Option<f64>,
    free_cash_flow: Option<f64>,
    operating_cf_ratio: Option<f64>,
    investing_cf_ratio: Option<f64>,
    cash_flow_coverage: Option<f64>,
    dividend_payout_ratio: Option<f64>,
    dividend_on_capital: Option<f64>,
    revenue_growth: Option<f64>,
    operating_income_growth: Option<f64>,
    net_income_growth: Option<f64>,
}

impl<'a> From<&'a RatioRow> for RatioCsvRow<'a> {
    fn from(row: &'a RatioRow) -> Self {
        let f = &row.figures;
        Self {
            fiscal_year: row.fiscal_year,
            period_label: &row.period_label,
            submission_date: row.submission_date,
            revenue: f.revenue,
            gross_profit: f.gross_profit,
            operating_income: f.operating_income,
            ordinary_income: f.ordinary_income,
            pretax_income: f.pretax_income,
            net_income: f.net_income,
            earnings_per_share: f.earnings_per_share,
            total_assets: f.total_assets,
            current_assets: f.current_assets,
            fixed_assets: f.fixed_assets,
            total_liabilities: f.total_liabilities,
            current_liabilities: f.current_liabilities,
            fixed_liabilities: f.fixed_liabilities,
            net_assets: f.net_assets,
            capital: f.capital,
            retained_earnings: f.retained_earnings,
            operating_cash_flow: f.operating_cash_flow,
            investing_cash_flow: f.investing_cash_flow,
            financing_cash_flow: f.financing_cash_flow,
            cash_equivalents: f.cash_equivalents,
            book_value_per_share: f.book_value_per_share,
            equity_ratio: f.equity_ratio,
            dividend: f.dividend,
            operating_margin: row.operating_margin,
            net_margin: row.net_margin,
            gross_margin: row.gross_margin,
            ordinary_margin: row.ordinary_margin,
            roa: row.roa,
            roe: row.roe,
            asset_turnover: row.asset_turnover,
            fixed_asset_turnover: row.fixed_asset_turnover,
            net_assets_turnover: row.net_assets_turnover,
            current_ratio: row.current_ratio,
            fixed_ratio: row.fixed_ratio,
            debt_ratio: row.debt_ratio,
            equity_ratio_pct: row.equity_ratio_pct,
            working_capital: row.working_capital,
            free_cash_flow: row.free_cash_flow,
            operating_cf_ratio: row.operating_cf_ratio,
            investing_cf_ratio: row.investing_cf_ratio,
            cash_flow_coverage: row.cash_flow_coverage,
            dividend_payout_ratio: row.dividend_payout_ratio,
            dividend_on_capital: row.dividend_on_capital,
            revenue_growth: row.growth.revenue,
            operating_income_growth: row.growth.operating_income,
            net_income_growth: row.growth.net_income,
        }
    }
}

/// Writes one line per fiscal year in ascending order. Undefined values
/// become empty cells.
pub fn write_ratio_csv<W: Write>(writer: W, table: &RatioTable) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut rows: Vec<&RatioRow> = table.rows.iter().collect();
    rows.sort_by_key(|r| r.fiscal_year);

    for row in rows {
        wtr.serialize(RatioCsvRow::from(row))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_ratio_csv_to_path<P: AsRef<Path>>(path: P, table: &RatioTable, bom: bool) -> Result<()> {
    let path = path.as_ref();
    let mut file = BufWriter::new(File::create(path)?);
    if bom {
        file.write_all(UTF8_BOM)?;
    }
    write_ratio_csv(&mut file, table)?;
    file.flush()?;

    info!("Wrote {} fiscal years to {}", table.rows.len(), path.display());
    Ok(())
}

pub fn write_json_to_path<P: AsRef<Path>>(path: P, report: &AnalysisReport) -> Result<()> {
    let path = path.as_ref();
    let file = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(file, report)?;

    info!("Wrote analysis report to {}", path.display());
    Ok(())
}
