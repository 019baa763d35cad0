use crate::error::{FilingAnalysisError, Result};
use crate::schema::{DocumentType, FilingRecord, FinancialField, FinancialFigures};
use crate::utils::{parse_amount, parse_submission_date};
use csv::{ReaderBuilder, StringRecord, Trim};
use log::{debug, info, warn};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// A metadata column, known by its EDINET header and an English alias.
#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub header: &'static str,
    pub alias: &'static str,
}

pub const SUBMISSION_DATE: ColumnSpec = ColumnSpec {
    header: "日付",
    alias: "submission_date",
};
pub const DOCUMENT_TYPE: ColumnSpec = ColumnSpec {
    header: "文書タイプ",
    alias: "document_type",
};
pub const FISCAL_PERIOD: ColumnSpec = ColumnSpec {
    header: "会計期間",
    alias: "fiscal_period",
};
pub const SECURITY_CODE: ColumnSpec = ColumnSpec {
    header: "証券コード",
    alias: "security_code",
};
pub const COMPANY_NAME: ColumnSpec = ColumnSpec {
    header: "会社名",
    alias: "company_name",
};

/// Positions of known columns within a header row.
#[derive(Debug, Clone)]
struct ColumnMap {
    submission_date: usize,
    document_type: usize,
    fiscal_period: usize,
    security_code: Option<usize>,
    company_name: Option<usize>,
    fields: Vec<(FinancialField, usize)>,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let names: Vec<String> = headers.iter().map(normalize_header).collect();
        let find = |header: &str, alias: &str| {
            names
                .iter()
                .position(|name| name == header || name.eq_ignore_ascii_case(alias))
        };
        let require = |spec: ColumnSpec| {
            find(spec.header, spec.alias)
                .ok_or_else(|| FilingAnalysisError::MissingColumn(spec.header.to_string()))
        };

        let mut fields = Vec::with_capacity(FinancialField::ALL.len());
        for field in FinancialField::ALL {
            match find(field.column_name(), field.alias()) {
                Some(index) => fields.push((field, index)),
                None => warn!(
                    "Column '{}' ({}) not present; treating it as missing for every filing",
                    field.column_name(),
                    field
                ),
            }
        }

        Ok(Self {
            submission_date: require(SUBMISSION_DATE)?,
            document_type: require(DOCUMENT_TYPE)?,
            fiscal_period: require(FISCAL_PERIOD)?,
            security_code: find(SECURITY_CODE.header, SECURITY_CODE.alias),
            company_name: find(COMPANY_NAME.header, COMPANY_NAME.alias),
            fields,
        })
    }
}

fn normalize_header(raw: &str) -> String {
    raw.trim().trim_start_matches('\u{feff}').trim().to_string()
}

fn optional_text(record: &StringRecord, index: Option<usize>) -> Option<String> {
    index
        .and_then(|i| record.get(i))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Reads a filing table. Every row must carry a parseable submission date;
/// the first one that does not aborts the whole batch. Numeric cells that
/// cannot be parsed are kept as missing.
pub fn read_filings<R: Read>(reader: R) -> Result<Vec<FilingRecord>> {
    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    let columns = ColumnMap::from_headers(rdr.headers()?)?;
    debug!("Column layout: {:?}", columns);

    let mut filings = Vec::new();
    for (index, result) in rdr.records().enumerate() {
        let row = result?;
        // Header is line 1.
        let line = row
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(index + 2);
        filings.push(parse_row(&row, &columns, line)?);
    }

    info!("Loaded {} filings", filings.len());
    Ok(filings)
}

pub fn read_filings_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<FilingRecord>> {
    let path = path.as_ref();
    info!("Reading filings from {}", path.display());
    let file = File::open(path)?;
    read_filings(file)
}

fn parse_row(row: &StringRecord, columns: &ColumnMap, line: usize) -> Result<FilingRecord> {
    let raw_date = row.get(columns.submission_date).unwrap_or("");
    let submission_date =
        parse_submission_date(raw_date).ok_or_else(|| FilingAnalysisError::InvalidDate {
            line,
            value: raw_date.to_string(),
        })?;

    let document_type = DocumentType::parse(row.get(columns.document_type).unwrap_or(""));
    let declared_period = row.get(columns.fiscal_period).unwrap_or("").to_string();

    let mut figures = FinancialFigures::default();
    for (field, index) in &columns.fields {
        let raw = row.get(*index).unwrap_or("");
        let value = parse_amount(raw);
        if value.is_none() && !raw.is_empty() {
            debug!("Line {}: '{}' in {} is not numeric, treated as missing", line, raw, field);
        }
        figures.set(*field, value);
    }

    debug!(
        "Line {}: {} submitted {}, {} figures present",
        line,
        document_type,
        submission_date,
        figures.present_count()
    );

    let mut record = FilingRecord::new(submission_date, document_type, declared_period)
        .with_figures(figures);
    record.security_code = optional_text(row, columns.security_code);
    record.company_name = optional_text(row, columns.company_name);
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const EDINET_SAMPLE: &str = "\
日付,証券コード,会社名,文書タイプ,会計期間,売上高,営業利益,当期純利益,総資産,流動資産,固定資産,総負債,純資産
2024-06-27,79740,任天堂株式会社,有価証券報告書,2024年度,\"1,671,865\",528941,490602,,2000,1000,-800,100
2024-08-05,79740,任天堂株式会社,四半期報告書,不明,266704,47151,n/a,3000,2000,1000,800,2200
";

    #[test]
    fn test_reads_edinet_headers() {
        let filings = read_filings(EDINET_SAMPLE.as_bytes()).unwrap();
        assert_eq!(filings.len(), 2);

        let annual = &filings[0];
        assert_eq!(
            annual.submission_date,
            NaiveDate::from_ymd_opt(2024, 6, 27).unwrap()
        );
        assert_eq!(annual.document_type, DocumentType::AnnualReport);
        assert_eq!(annual.declared_period, "2024年度");
        assert_eq!(annual.company_name.as_deref(), Some("任天堂株式会社"));
        assert_eq!(annual.security_code.as_deref(), Some("79740"));
        assert_eq!(annual.figures.revenue, Some(1_671_865.0));
        assert_eq!(annual.figures.total_assets, None);
        assert_eq!(annual.figures.total_liabilities, Some(-800.0));
        assert_eq!(annual.fiscal_period, None);

        let quarterly = &filings[1];
        assert_eq!(quarterly.document_type, DocumentType::QuarterlyReport);
        assert_eq!(quarterly.figures.net_income, None);
        assert_eq!(quarterly.figures.revenue, Some(266_704.0));
    }

    #[test]
    fn test_absent_numeric_columns_are_missing() {
        let filings = read_filings(EDINET_SAMPLE.as_bytes()).unwrap();
        assert_eq!(filings[0].figures.dividend, None);
        assert_eq!(filings[0].figures.cash_equivalents, None);
    }

    #[test]
    fn test_reads_english_aliases_and_bom() {
        let csv = "\u{feff}submission_date,document_type,fiscal_period,revenue,net_income\n\
                   2023/06/30,AnnualReport,FY2022,1000,80\n";
        let filings = read_filings(csv.as_bytes()).unwrap();
        assert_eq!(filings.len(), 1);
        assert_eq!(filings[0].document_type, DocumentType::AnnualReport);
        assert_eq!(filings[0].figures.revenue, Some(1000.0));
        assert_eq!(filings[0].figures.net_income, Some(80.0));
    }

    #[test]
    fn test_missing_required_column_is_fatal() {
        let csv = "日付,会計期間,売上高\n2024-06-27,2023,100\n";
        match read_filings(csv.as_bytes()) {
            Err(FilingAnalysisError::MissingColumn(column)) => assert_eq!(column, "文書タイプ"),
            other => panic!("expected MissingColumn, got {:?}", other),
        }
    }

    #[test]
    fn test_unparseable_date_aborts_batch() {
        let csv = "日付,文書タイプ,会計期間\n2024-06-27,有価証券報告書,\nnot-a-date,有価証券報告書,\n";
        match read_filings(csv.as_bytes()) {
            Err(FilingAnalysisError::InvalidDate { line, value }) => {
                assert_eq!(line, 3);
                assert_eq!(value, "not-a-date");
            }
            other => panic!("expected InvalidDate, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_document_type_preserved() {
        let csv = "日付,文書タイプ,会計期間\n2024-06-27,訂正有価証券報告書,2023年度\n";
        let filings = read_filings(csv.as_bytes()).unwrap();
        assert_eq!(
            filings[0].document_type,
            DocumentType::Other("訂正有価証券報告書".to_string())
        );
        assert_eq!(filings[0].period_label, "2023年度");
    }
}
