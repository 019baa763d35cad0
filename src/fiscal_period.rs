use crate::schema::{DocumentType, FilingRecord};
use chrono::{Datelike, NaiveDate};
use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Accounting period a filing's figures describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
pub struct FiscalPeriod {
    pub fiscal_year: i32,

    #[schemars(description = "Quarter number 1-4 for quarterly filings; absent for annual filings.")]
    pub quarter: Option<u8>,
}

impl FiscalPeriod {
    pub fn annual(fiscal_year: i32) -> Self {
        Self {
            fiscal_year,
            quarter: None,
        }
    }

    pub fn quarterly(fiscal_year: i32, quarter: u8) -> Self {
        Self {
            fiscal_year,
            quarter: Some(quarter),
        }
    }

    /// Canonical label: "2023" for annual periods, "2024 Q1" for quarters.
    pub fn label(&self) -> String {
        match self.quarter {
            Some(q) => format!("{} Q{}", self.fiscal_year, q),
            None => self.fiscal_year.to_string(),
        }
    }

    /// Reads a canonical label back. Returns `None` for anything else,
    /// including quarter numbers outside 1-4.
    pub fn parse_label(label: &str) -> Option<Self> {
        let label = label.trim();
        match label.split_once(' ') {
            None => label.parse().ok().map(Self::annual),
            Some((year, quarter)) => {
                let year: i32 = year.parse().ok()?;
                let quarter: u8 = quarter.strip_prefix('Q')?.parse().ok()?;
                if (1..=4).contains(&quarter) {
                    Some(Self::quarterly(year, quarter))
                } else {
                    None
                }
            }
        }
    }
}

impl fmt::Display for FiscalPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Derives the fiscal period from the submission date.
///
/// Annual reports describe the year before submission. Quarterly reports are
/// mapped by submission month:
///
/// | month | quarter | fiscal year |
/// |-------|---------|-------------|
/// | 1-3   | Q3      | year - 1    |
/// | 4-6   | Q4      | year - 1    |
/// | 7-9   | Q1      | year        |
/// | 10-12 | Q2      | year        |
///
/// Other document types have no canonical period.
pub fn resolve_fiscal_period(
    submission_date: NaiveDate,
    document_type: &DocumentType,
) -> Option<FiscalPeriod> {
    let year = submission_date.year();

    match document_type {
        DocumentType::AnnualReport => Some(FiscalPeriod::annual(year - 1)),
        DocumentType::QuarterlyReport => {
            let (quarter, fiscal_year) = match submission_date.month() {
                1..=3 => (3, year - 1),
                4..=6 => (4, year - 1),
                7..=9 => (1, year),
                _ => (2, year),
            };
            Some(FiscalPeriod::quarterly(fiscal_year, quarter))
        }
        DocumentType::Other(_) => None,
    }
}

impl FilingRecord {
    /// Rewrites the period label from the submission date and document type.
    /// Only `fiscal_period` and `period_label` are touched; unrecognized
    /// document types keep their declared label.
    pub fn resolve_period(&mut self) -> Option<FiscalPeriod> {
        match resolve_fiscal_period(self.submission_date, &self.document_type) {
            Some(period) => {
                let label = period.label();
                if label != self.declared_period {
                    debug!(
                        "Period for {} submitted {} corrected: '{}' -> '{}'",
                        self.document_type, self.submission_date, self.declared_period, label
                    );
                }
                self.fiscal_period = Some(period);
                self.period_label = label;
                Some(period)
            }
            None => {
                debug!(
                    "Unrecognized document type '{}' submitted {}; keeping label '{}'",
                    self.document_type, self.submission_date, self.period_label
                );
                None
            }
        }
    }
}

/// Resolves every record in place and returns how many got a canonical period.
pub fn resolve_all(records: &mut [FilingRecord]) -> usize {
    records
        .iter_mut()
        .filter_map(|record| record.resolve_period())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_annual_report_is_previous_year() {
        for month in 1..=12 {
            let period = resolve_fiscal_period(date(2024, month, 15), &DocumentType::AnnualReport)
                .unwrap();
            assert_eq!(period.fiscal_year, 2023);
            assert_eq!(period.quarter, None);
            assert_eq!(period.label(), "2023");
        }
    }

    #[test]
    fn test_quarterly_mapping_for_every_month() {
        let expected = [
            (1, 3, 2023),
            (2, 3, 2023),
            (3, 3, 2023),
            (4, 4, 2023),
            (5, 4, 2023),
            (6, 4, 2023),
            (7, 1, 2024),
            (8, 1, 2024),
            (9, 1, 2024),
            (10, 2, 2024),
            (11, 2, 2024),
            (12, 2, 2024),
        ];

        for (month, quarter, fiscal_year) in expected {
            let period =
                resolve_fiscal_period(date(2024, month, 1), &DocumentType::QuarterlyReport)
                    .unwrap();
            assert_eq!(
                period,
                FiscalPeriod::quarterly(fiscal_year, quarter),
                "month {}",
                month
            );
        }
    }

    #[test]
    fn test_quarterly_boundaries() {
        let q = |d: NaiveDate| {
            resolve_fiscal_period(d, &DocumentType::QuarterlyReport)
                .unwrap()
                .label()
        };

        assert_eq!(q(date(2024, 3, 31)), "2023 Q3");
        assert_eq!(q(date(2024, 4, 1)), "2023 Q4");
        assert_eq!(q(date(2024, 6, 30)), "2023 Q4");
        assert_eq!(q(date(2024, 7, 1)), "2024 Q1");
        assert_eq!(q(date(2024, 9, 30)), "2024 Q1");
        assert_eq!(q(date(2024, 10, 1)), "2024 Q2");
        assert_eq!(q(date(2024, 12, 31)), "2024 Q2");
        assert_eq!(q(date(2025, 1, 1)), "2024 Q3");
    }

    #[test]
    fn test_unrecognized_type_keeps_declared_label() {
        let mut record = FilingRecord::new(
            date(2024, 6, 27),
            DocumentType::Other("訂正有価証券報告書".to_string()),
            "2022年度",
        );

        assert_eq!(record.resolve_period(), None);
        assert_eq!(record.period_label, "2022年度");
        assert_eq!(record.fiscal_period, None);
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let mut record =
            FilingRecord::new(date(2024, 8, 5), DocumentType::QuarterlyReport, "2023年度");
        record.resolve_period();
        let first = record.clone();
        record.resolve_period();

        assert_eq!(record, first);
        assert_eq!(record.period_label, "2024 Q1");
        assert_eq!(record.declared_period, "2023年度");
    }

    #[test]
    fn test_resolve_all_counts_recognized_records() {
        let mut records = vec![
            FilingRecord::new(date(2024, 6, 27), DocumentType::AnnualReport, ""),
            FilingRecord::new(date(2024, 8, 5), DocumentType::QuarterlyReport, ""),
            FilingRecord::new(date(2024, 9, 1), DocumentType::Other("その他".into()), "keep"),
        ];

        assert_eq!(resolve_all(&mut records), 2);
        assert_eq!(records[0].period_label, "2023");
        assert_eq!(records[1].period_label, "2024 Q1");
        assert_eq!(records[2].period_label, "keep");
    }

    #[test]
    fn test_parse_label() {
        assert_eq!(FiscalPeriod::parse_label("2023"), Some(FiscalPeriod::annual(2023)));
        assert_eq!(
            FiscalPeriod::parse_label("2024 Q1"),
            Some(FiscalPeriod::quarterly(2024, 1))
        );
        assert_eq!(FiscalPeriod::parse_label("2024 Q5"), None);
        assert_eq!(FiscalPeriod::parse_label("2023年度"), None);
    }
}
