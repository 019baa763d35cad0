//! # Financial Filing Analyzer
//!
//! A library for turning a company's periodic regulatory filings (annual and
//! quarterly reports, as exported from EDINET) into a consistent annual ratio
//! table and a simple revenue trend.
//!
//! ## Core Concepts
//!
//! - **Fiscal Period Resolution**: the period a filing describes is inferred from its
//!   submission date and document type, replacing whatever label the source carried
//! - **Annual Series**: annual filings ordered by fiscal year; the unit ratios and growth
//!   are computed on
//! - **Value Repair**: rule-based correction of missing or implausible balance-sheet
//!   figures, applied to a working copy and reported as structured events
//! - **Guarded Ratios**: every division checks its denominator; undefined results are
//!   `None`, never `inf`, `NaN` or a panic
//!
//! ## Example
//!
//! ```rust,ignore
//! use financial_filing_analyzer::*;
//!
//! let mut filings = read_filings_from_path("nintendo_.csv")?;
//! let report = FilingAnalyzer::new(AnalysisConfig::default())?.analyze(&mut filings);
//!
//! for row in &report.ratios {
//!     println!("{}: ROE {:?}", row.fiscal_year, row.roe);
//! }
//! ```

pub mod config;
pub mod error;
pub mod fiscal_period;
pub mod forecast;
pub mod ingestion;
pub mod ratios;
pub mod repair;
pub mod report;
pub mod schema;
pub mod utils;

pub use config::AnalysisConfig;
pub use error::{FilingAnalysisError, Result};
pub use fiscal_period::{resolve_all, resolve_fiscal_period, FiscalPeriod};
pub use forecast::{fit_revenue_trend, RevenueForecast, TrendLine, YearValue};
pub use ingestion::{read_filings, read_filings_from_path};
pub use ratios::{
    GrowthRates, RatioCalculation, RatioCalculator, RatioConfig, RatioMode, RatioRow, RatioTable,
};
pub use repair::{RepairConfig, RepairEvent, RepairOutcome, RepairRule, ValueRepairEngine};
pub use report::{
    write_json_to_path, write_ratio_csv, write_ratio_csv_to_path, AnalysisReport,
    LatestYearSummary,
};
pub use schema::{AnnualSeries, DocumentType, FilingRecord, FinancialField, FinancialFigures};

use log::{debug, info, warn};
use std::path::Path;

pub struct FilingAnalyzer {
    config: AnalysisConfig,
}

impl FilingAnalyzer {
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Runs the full pipeline over an in-memory batch.
    ///
    /// Period labels are rewritten in place; balance-sheet repairs are made
    /// on a separate annual working copy, so `filings` keeps the figures as
    /// read.
    pub fn analyze(&self, filings: &mut [FilingRecord]) -> AnalysisReport {
        info!("Analyzing {} filings", filings.len());

        let periods_resolved = resolve_all(filings);
        debug!(
            "{} of {} filings resolved to a canonical fiscal period",
            periods_resolved,
            filings.len()
        );

        let series = AnnualSeries::from_records(filings);
        warn_on_duplicate_years(&series);

        let calculation = RatioCalculator::new(self.config.ratios)
            .with_mode(self.config.ratio_mode)
            .with_repair_config(self.config.repair)
            .calculate(&series);

        let forecast = match fit_revenue_trend(
            &calculation.series.revenue_points(),
            self.config.forecast_horizon,
        ) {
            Ok(forecast) => Some(forecast),
            Err(e) => {
                warn!("Revenue forecast skipped: {}", e);
                None
            }
        };

        let summary = LatestYearSummary::from_table(&calculation.table);

        AnalysisReport {
            company_name: filings.iter().find_map(|f| f.company_name.clone()),
            security_code: filings.iter().find_map(|f| f.security_code.clone()),
            filings_read: filings.len(),
            periods_resolved,
            mode: calculation.table.mode,
            ratios: calculation.table.rows,
            repairs: calculation.repairs,
            forecast,
            summary,
        }
    }

    /// Loads a CSV export and analyzes it. Returns the resolved filings
    /// alongside the report.
    pub fn analyze_path<P: AsRef<Path>>(
        &self,
        path: P,
    ) -> Result<(Vec<FilingRecord>, AnalysisReport)> {
        let mut filings = read_filings_from_path(path)?;
        let report = self.analyze(&mut filings);
        Ok((filings, report))
    }
}

impl Default for FilingAnalyzer {
    fn default() -> Self {
        Self {
            config: AnalysisConfig::default(),
        }
    }
}

/// Analyzes a batch with the default configuration.
pub fn analyze_filings(filings: &mut [FilingRecord]) -> AnalysisReport {
    FilingAnalyzer::default().analyze(filings)
}

fn warn_on_duplicate_years(series: &AnnualSeries) {
    let years = series.fiscal_years();
    for pair in years.windows(2) {
        if pair[0] == pair[1] {
            warn!(
                "Fiscal year {} has more than one annual filing; growth for the later one is measured against the earlier",
                pair[1]
            );
        }
    }
}
