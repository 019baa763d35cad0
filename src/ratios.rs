use crate::repair::{RepairConfig, RepairEvent, ValueRepairEngine};
use crate::schema::{AnnualSeries, FilingRecord, FinancialFigures};
use crate::utils::{difference, finite, percent_change, positive, safe_percentage, safe_ratio, sum};
use chrono::NaiveDate;
use log::{debug, info};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Whether ratios are computed on repaired figures or on the filings as read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RatioMode {
    /// Filings as read, no anomaly detection.
    Raw,
    #[default]
    Repaired,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RatioConfig {
    #[schemars(
        description = "ROE is reported only when net assets exceed this amount (currency units)."
    )]
    pub roe_equity_floor: f64,

    #[schemars(description = "Upper bound applied to ROE in percent.")]
    pub roe_cap: f64,
}

impl Default for RatioConfig {
    fn default() -> Self {
        Self {
            roe_equity_floor: 10_000_000_000.0,
            roe_cap: 50.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GrowthRates {
    pub revenue: Option<f64>,
    pub operating_income: Option<f64>,
    pub net_income: Option<f64>,
}

/// Derived figures for one fiscal year. Every ratio is `None` when its inputs
/// are missing or its denominator is not positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RatioRow {
    pub fiscal_year: i32,
    pub period_label: String,
    pub submission_date: NaiveDate,
    pub figures: FinancialFigures,

    // Profitability, percent of revenue
    pub operating_margin: Option<f64>,
    pub net_margin: Option<f64>,
    pub gross_margin: Option<f64>,
    pub ordinary_margin: Option<f64>,
    pub roa: Option<f64>,
    pub roe: Option<f64>,

    // Efficiency, times
    pub asset_turnover: Option<f64>,
    pub fixed_asset_turnover: Option<f64>,
    pub net_assets_turnover: Option<f64>,

    // Safety, percent
    pub current_ratio: Option<f64>,
    pub fixed_ratio: Option<f64>,
    pub debt_ratio: Option<f64>,
    pub equity_ratio_pct: Option<f64>,

    pub working_capital: Option<f64>,

    // Cash flow
    pub free_cash_flow: Option<f64>,
    #[schemars(description = "Operating cash flow as a percent of revenue.")]
    pub operating_cf_ratio: Option<f64>,
    #[schemars(description = "Investing cash flow as a percent of total assets.")]
    pub investing_cf_ratio: Option<f64>,
    #[schemars(
        description = "Operating cash flow over investing outflow in percent. Undefined unless investing cash flow is negative."
    )]
    pub cash_flow_coverage: Option<f64>,

    // Shareholder returns, percent
    pub dividend_payout_ratio: Option<f64>,
    #[schemars(description = "Dividends over paid-in capital, a simplified yield.")]
    pub dividend_on_capital: Option<f64>,

    pub growth: GrowthRates,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RatioTable {
    pub mode: RatioMode,
    pub rows: Vec<RatioRow>,
}

impl RatioTable {
    pub fn latest(&self) -> Option<&RatioRow> {
        self.rows.last()
    }

    pub fn row_for_year(&self, fiscal_year: i32) -> Option<&RatioRow> {
        self.rows.iter().rev().find(|r| r.fiscal_year == fiscal_year)
    }
}

/// Result of a ratio run: the table, the series it was computed from, and the
/// corrections applied to get there (empty in raw mode).
#[derive(Debug, Clone, PartialEq)]
pub struct RatioCalculation {
    pub table: RatioTable,
    pub series: AnnualSeries,
    pub repairs: Vec<RepairEvent>,
}

pub struct RatioCalculator {
    config: RatioConfig,
    mode: RatioMode,
    repair: RepairConfig,
}

impl RatioCalculator {
    pub fn new(config: RatioConfig) -> Self {
        Self {
            config,
            mode: RatioMode::default(),
            repair: RepairConfig::default(),
        }
    }

    pub fn with_mode(mut self, mode: RatioMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_repair_config(mut self, repair: RepairConfig) -> Self {
        self.repair = repair;
        self
    }

    pub fn mode(&self) -> RatioMode {
        self.mode
    }

    /// Runs the repair stage (in repaired mode) and derives one row per
    /// entry of the series, in series order.
    pub fn calculate(&self, series: &AnnualSeries) -> RatioCalculation {
        let (working, repairs) = match self.mode {
            RatioMode::Repaired => ValueRepairEngine::new(self.repair).repair_series(series),
            RatioMode::Raw => (series.clone(), Vec::new()),
        };

        let table = self.ratio_table(&working);

        info!(
            "Calculated ratios for {} fiscal years ({:?} mode, {} corrections)",
            table.rows.len(),
            self.mode,
            repairs.len()
        );

        RatioCalculation {
            table,
            series: working,
            repairs,
        }
    }

    /// Derives ratios from the series exactly as given.
    pub fn ratio_table(&self, series: &AnnualSeries) -> RatioTable {
        let mut rows = Vec::with_capacity(series.len());
        let mut previous: Option<&FilingRecord> = None;

        for record in series {
            let Some(fiscal_year) = record.fiscal_year() else {
                debug!(
                    "Skipping filing submitted {} without a fiscal year",
                    record.submission_date
                );
                continue;
            };

            rows.push(self.ratio_row(fiscal_year, record, previous));
            previous = Some(record);
        }

        RatioTable {
            mode: self.mode,
            rows,
        }
    }

    fn ratio_row(
        &self,
        fiscal_year: i32,
        record: &FilingRecord,
        previous: Option<&FilingRecord>,
    ) -> RatioRow {
        let f = &record.figures;

        RatioRow {
            fiscal_year,
            period_label: record.period_label.clone(),
            submission_date: record.submission_date,
            figures: f.clone(),

            operating_margin: safe_percentage(f.operating_income, f.revenue),
            net_margin: safe_percentage(f.net_income, f.revenue),
            gross_margin: safe_percentage(f.gross_profit, f.revenue),
            ordinary_margin: safe_percentage(f.ordinary_income, f.revenue),
            roa: safe_percentage(f.net_income, f.total_assets),
            roe: self.return_on_equity(f.net_income, f.net_assets),

            asset_turnover: safe_ratio(f.revenue, f.total_assets),
            fixed_asset_turnover: safe_ratio(f.revenue, f.fixed_assets),
            net_assets_turnover: safe_ratio(f.revenue, f.net_assets),

            current_ratio: safe_percentage(f.current_assets, f.current_liabilities),
            fixed_ratio: safe_percentage(f.fixed_assets, f.net_assets),
            debt_ratio: safe_percentage(f.total_liabilities, f.total_assets),
            equity_ratio_pct: f.equity_ratio.and_then(|r| finite(r * 100.0)),

            working_capital: difference(f.current_assets, f.current_liabilities),
            free_cash_flow: sum(f.operating_cash_flow, f.investing_cash_flow),
            operating_cf_ratio: safe_percentage(f.operating_cash_flow, f.revenue),
            investing_cf_ratio: safe_percentage(f.investing_cash_flow, f.total_assets),
            cash_flow_coverage: safe_percentage(
                f.operating_cash_flow,
                f.investing_cash_flow.map(|v| -v),
            ),

            dividend_payout_ratio: safe_percentage(f.dividend, f.net_income),
            dividend_on_capital: safe_percentage(f.dividend, f.capital),

            growth: growth_rates(previous.map(|p| &p.figures), f),
        }
    }

    /// Net income over net assets in percent, reported only above the equity
    /// floor and capped at the configured maximum.
    pub fn return_on_equity(&self, net_income: Option<f64>, net_assets: Option<f64>) -> Option<f64> {
        let equity = positive(net_assets).filter(|e| *e > self.config.roe_equity_floor)?;
        let roe = safe_percentage(net_income, Some(equity))?;
        Some(roe.min(self.config.roe_cap))
    }
}

impl Default for RatioCalculator {
    fn default() -> Self {
        Self::new(RatioConfig::default())
    }
}

fn growth_rates(previous: Option<&FinancialFigures>, current: &FinancialFigures) -> GrowthRates {
    let Some(previous) = previous else {
        return GrowthRates::default();
    };

    GrowthRates {
        revenue: percent_change(previous.revenue, current.revenue),
        operating_income: percent_change(previous.operating_income, current.operating_income),
        net_income: percent_change(previous.net_income, current.net_income),
    }
}
