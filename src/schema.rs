use crate::fiscal_period::{resolve_fiscal_period, FiscalPeriod};
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum DocumentType {
    #[schemars(description = "Annual securities report (有価証券報告書). Covers the fiscal year before submission.")]
    AnnualReport,

    #[schemars(description = "Quarterly report (四半期報告書). The submission month selects the quarter.")]
    QuarterlyReport,

    #[schemars(
        description = "Any other filing type (amended reports, foreign-company variants, registration statements). Its declared period is passed through untouched."
    )]
    Other(String),
}

impl DocumentType {
    /// Maps the document type cell of an EDINET export (or its English name)
    /// onto a known type. Unknown text is preserved verbatim in `Other`.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed {
            "有価証券報告書" => return Self::AnnualReport,
            "四半期報告書" => return Self::QuarterlyReport,
            _ => {}
        }

        match trimmed.to_ascii_lowercase().as_str() {
            "annualreport" | "annual_report" | "annual report" | "annual" => Self::AnnualReport,
            "quarterlyreport" | "quarterly_report" | "quarterly report" | "quarterly" => {
                Self::QuarterlyReport
            }
            _ => Self::Other(trimmed.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::AnnualReport => "有価証券報告書",
            Self::QuarterlyReport => "四半期報告書",
            Self::Other(raw) => raw,
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every numeric column a filing row can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FinancialField {
    Revenue,
    GrossProfit,
    OperatingIncome,
    OrdinaryIncome,
    PretaxIncome,
    NetIncome,
    EarningsPerShare,
    TotalAssets,
    CurrentAssets,
    FixedAssets,
    TotalLiabilities,
    CurrentLiabilities,
    FixedLiabilities,
    NetAssets,
    Capital,
    RetainedEarnings,
    OperatingCashFlow,
    InvestingCashFlow,
    FinancingCashFlow,
    CashEquivalents,
    BookValuePerShare,
    EquityRatio,
    Dividend,
}

impl FinancialField {
    pub const ALL: [FinancialField; 23] = [
        Self::Revenue,
        Self::GrossProfit,
        Self::OperatingIncome,
        Self::OrdinaryIncome,
        Self::PretaxIncome,
        Self::NetIncome,
        Self::EarningsPerShare,
        Self::TotalAssets,
        Self::CurrentAssets,
        Self::FixedAssets,
        Self::TotalLiabilities,
        Self::CurrentLiabilities,
        Self::FixedLiabilities,
        Self::NetAssets,
        Self::Capital,
        Self::RetainedEarnings,
        Self::OperatingCashFlow,
        Self::InvestingCashFlow,
        Self::FinancingCashFlow,
        Self::CashEquivalents,
        Self::BookValuePerShare,
        Self::EquityRatio,
        Self::Dividend,
    ];

    /// Column header used by the EDINET export.
    pub fn column_name(self) -> &'static str {
        match self {
            Self::Revenue => "売上高",
            Self::GrossProfit => "売上総利益",
            Self::OperatingIncome => "営業利益",
            Self::OrdinaryIncome => "経常利益",
            Self::PretaxIncome => "税引前当期純利益",
            Self::NetIncome => "当期純利益",
            Self::EarningsPerShare => "1株当たり当期純利益",
            Self::TotalAssets => "総資産",
            Self::CurrentAssets => "流動資産",
            Self::FixedAssets => "固定資産",
            Self::TotalLiabilities => "総負債",
            Self::CurrentLiabilities => "流動負債",
            Self::FixedLiabilities => "固定負債",
            Self::NetAssets => "純資産",
            Self::Capital => "資本金",
            Self::RetainedEarnings => "利益剰余金",
            Self::OperatingCashFlow => "営業CF",
            Self::InvestingCashFlow => "投資CF",
            Self::FinancingCashFlow => "財務CF",
            Self::CashEquivalents => "現金及び現金同等物",
            Self::BookValuePerShare => "1株当たり純資産",
            Self::EquityRatio => "自己資本比率",
            Self::Dividend => "配当金",
        }
    }

    /// English snake_case name, accepted as an alternative header.
    pub fn alias(self) -> &'static str {
        match self {
            Self::Revenue => "revenue",
            Self::GrossProfit => "gross_profit",
            Self::OperatingIncome => "operating_income",
            Self::OrdinaryIncome => "ordinary_income",
            Self::PretaxIncome => "pretax_income",
            Self::NetIncome => "net_income",
            Self::EarningsPerShare => "earnings_per_share",
            Self::TotalAssets => "total_assets",
            Self::CurrentAssets => "current_assets",
            Self::FixedAssets => "fixed_assets",
            Self::TotalLiabilities => "total_liabilities",
            Self::CurrentLiabilities => "current_liabilities",
            Self::FixedLiabilities => "fixed_liabilities",
            Self::NetAssets => "net_assets",
            Self::Capital => "capital",
            Self::RetainedEarnings => "retained_earnings",
            Self::OperatingCashFlow => "operating_cash_flow",
            Self::InvestingCashFlow => "investing_cash_flow",
            Self::FinancingCashFlow => "financing_cash_flow",
            Self::CashEquivalents => "cash_equivalents",
            Self::BookValuePerShare => "book_value_per_share",
            Self::EquityRatio => "equity_ratio",
            Self::Dividend => "dividend",
        }
    }

    /// Liabilities are reported as magnitudes; a negative value is a sign error.
    pub fn is_liability(self) -> bool {
        matches!(
            self,
            Self::TotalLiabilities | Self::CurrentLiabilities | Self::FixedLiabilities
        )
    }
}

impl fmt::Display for FinancialField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.alias())
    }
}

/// Numeric contents of one filing. `None` means the value was absent, blank,
/// non-numeric or NaN in the source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FinancialFigures {
    pub revenue: Option<f64>,
    pub gross_profit: Option<f64>,
    pub operating_income: Option<f64>,
    pub ordinary_income: Option<f64>,
    pub pretax_income: Option<f64>,
    pub net_income: Option<f64>,
    pub earnings_per_share: Option<f64>,
    pub total_assets: Option<f64>,
    pub current_assets: Option<f64>,
    pub fixed_assets: Option<f64>,
    pub total_liabilities: Option<f64>,
    pub current_liabilities: Option<f64>,
    pub fixed_liabilities: Option<f64>,
    pub net_assets: Option<f64>,
    pub capital: Option<f64>,
    pub retained_earnings: Option<f64>,
    pub operating_cash_flow: Option<f64>,
    pub investing_cash_flow: Option<f64>,
    pub financing_cash_flow: Option<f64>,
    pub cash_equivalents: Option<f64>,
    pub book_value_per_share: Option<f64>,
    #[schemars(description = "Equity-to-asset ratio as reported, a fraction (0.8 = 80%).")]
    pub equity_ratio: Option<f64>,
    pub dividend: Option<f64>,
}

impl FinancialFigures {
    pub fn get(&self, field: FinancialField) -> Option<f64> {
        *self.slot(field)
    }

    /// Non-finite values are stored as missing.
    pub fn set(&mut self, field: FinancialField, value: Option<f64>) {
        *self.slot_mut(field) = value.filter(|v| v.is_finite());
    }

    pub fn with(mut self, field: FinancialField, value: f64) -> Self {
        self.set(field, Some(value));
        self
    }

    pub fn present_count(&self) -> usize {
        FinancialField::ALL
            .iter()
            .filter(|field| self.get(**field).is_some())
            .count()
    }

    fn slot(&self, field: FinancialField) -> &Option<f64> {
        match field {
            FinancialField::Revenue => &self.revenue,
            FinancialField::GrossProfit => &self.gross_profit,
            FinancialField::OperatingIncome => &self.operating_income,
            FinancialField::OrdinaryIncome => &self.ordinary_income,
            FinancialField::PretaxIncome => &self.pretax_income,
            FinancialField::NetIncome => &self.net_income,
            FinancialField::EarningsPerShare => &self.earnings_per_share,
            FinancialField::TotalAssets => &self.total_assets,
            FinancialField::CurrentAssets => &self.current_assets,
            FinancialField::FixedAssets => &self.fixed_assets,
            FinancialField::TotalLiabilities => &self.total_liabilities,
            FinancialField::CurrentLiabilities => &self.current_liabilities,
            FinancialField::FixedLiabilities => &self.fixed_liabilities,
            FinancialField::NetAssets => &self.net_assets,
            FinancialField::Capital => &self.capital,
            FinancialField::RetainedEarnings => &self.retained_earnings,
            FinancialField::OperatingCashFlow => &self.operating_cash_flow,
            FinancialField::InvestingCashFlow => &self.investing_cash_flow,
            FinancialField::FinancingCashFlow => &self.financing_cash_flow,
            FinancialField::CashEquivalents => &self.cash_equivalents,
            FinancialField::BookValuePerShare => &self.book_value_per_share,
            FinancialField::EquityRatio => &self.equity_ratio,
            FinancialField::Dividend => &self.dividend,
        }
    }

    fn slot_mut(&mut self, field: FinancialField) -> &mut Option<f64> {
        match field {
            FinancialField::Revenue => &mut self.revenue,
            FinancialField::GrossProfit => &mut self.gross_profit,
            FinancialField::OperatingIncome => &mut self.operating_income,
            FinancialField::OrdinaryIncome => &mut self.ordinary_income,
            FinancialField::PretaxIncome => &mut self.pretax_income,
            FinancialField::NetIncome => &mut self.net_income,
            FinancialField::EarningsPerShare => &mut self.earnings_per_share,
            FinancialField::TotalAssets => &mut self.total_assets,
            FinancialField::CurrentAssets => &mut self.current_assets,
            FinancialField::FixedAssets => &mut self.fixed_assets,
            FinancialField::TotalLiabilities => &mut self.total_liabilities,
            FinancialField::CurrentLiabilities => &mut self.current_liabilities,
            FinancialField::FixedLiabilities => &mut self.fixed_liabilities,
            FinancialField::NetAssets => &mut self.net_assets,
            FinancialField::Capital => &mut self.capital,
            FinancialField::RetainedEarnings => &mut self.retained_earnings,
            FinancialField::OperatingCashFlow => &mut self.operating_cash_flow,
            FinancialField::InvestingCashFlow => &mut self.investing_cash_flow,
            FinancialField::FinancingCashFlow => &mut self.financing_cash_flow,
            FinancialField::CashEquivalents => &mut self.cash_equivalents,
            FinancialField::BookValuePerShare => &mut self.book_value_per_share,
            FinancialField::EquityRatio => &mut self.equity_ratio,
            FinancialField::Dividend => &mut self.dividend,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FilingRecord {
    pub submission_date: NaiveDate,
    pub document_type: DocumentType,

    #[schemars(description = "Fiscal period label exactly as it appeared in the source row.")]
    pub declared_period: String,

    #[schemars(
        description = "Canonical label after period resolution (\"2023\", \"2024 Q1\"). Equals the declared label for unrecognized document types."
    )]
    pub period_label: String,

    pub fiscal_period: Option<FiscalPeriod>,
    pub security_code: Option<String>,
    pub company_name: Option<String>,
    pub figures: FinancialFigures,
}

impl FilingRecord {
    pub fn new(
        submission_date: NaiveDate,
        document_type: DocumentType,
        declared_period: impl Into<String>,
    ) -> Self {
        let declared_period = declared_period.into();
        Self {
            submission_date,
            document_type,
            period_label: declared_period.clone(),
            declared_period,
            fiscal_period: None,
            security_code: None,
            company_name: None,
            figures: FinancialFigures::default(),
        }
    }

    pub fn with_figures(mut self, figures: FinancialFigures) -> Self {
        self.figures = figures;
        self
    }

    pub fn is_annual(&self) -> bool {
        self.document_type == DocumentType::AnnualReport
    }

    pub fn fiscal_year(&self) -> Option<i32> {
        self.fiscal_period.as_ref().map(|p| p.fiscal_year)
    }
}

/// Annual filings ordered by fiscal year. Growth rates and the revenue trend
/// read neighbouring entries, so the ordering is part of the contract.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnnualSeries {
    records: Vec<FilingRecord>,
}

impl AnnualSeries {
    /// Selects annual filings from a batch, resolving any that have not been
    /// resolved yet, and sorts them by fiscal year then submission date.
    pub fn from_records(records: &[FilingRecord]) -> Self {
        let mut annual: Vec<FilingRecord> = records
            .iter()
            .filter(|r| r.is_annual())
            .cloned()
            .map(|mut r| {
                if r.fiscal_period.is_none() {
                    r.fiscal_period = resolve_fiscal_period(r.submission_date, &r.document_type);
                    if let Some(period) = &r.fiscal_period {
                        r.period_label = period.label();
                    }
                }
                r
            })
            .collect();

        annual.sort_by_key(|r| (r.fiscal_year(), r.submission_date));
        Self { records: annual }
    }

    /// Builds a series from records already in order. Used by the repair
    /// stage, which maps entries one to one.
    pub(crate) fn from_ordered(records: Vec<FilingRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[FilingRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FilingRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn fiscal_years(&self) -> Vec<i32> {
        self.records.iter().filter_map(|r| r.fiscal_year()).collect()
    }

    /// `(fiscal year, revenue)` pairs with missing revenue skipped.
    pub fn revenue_points(&self) -> Vec<(i32, f64)> {
        self.records
            .iter()
            .filter_map(|r| Some((r.fiscal_year()?, r.figures.revenue?)))
            .collect()
    }
}

impl<'a> IntoIterator for &'a AnnualSeries {
    type Item = &'a FilingRecord;
    type IntoIter = std::slice::Iter<'a, FilingRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
