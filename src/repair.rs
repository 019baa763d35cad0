use crate::schema::{AnnualSeries, FilingRecord, FinancialField, FinancialFigures};
use crate::utils::positive;
use log::{debug, info};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RepairConfig {
    #[schemars(
        description = "Net assets below this share of total assets are treated as a parsing or scale error and recomputed as total assets minus total liabilities."
    )]
    pub min_equity_share: f64,
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            min_equity_share: 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RepairRule {
    /// Total assets missing or non-positive; rebuilt from current + fixed assets.
    TotalAssetsFromComponents,
    /// Net assets missing or non-positive; rebuilt from total assets - |liabilities|.
    EquityMissingOrNonPositive,
    /// Net assets implausibly small relative to total assets.
    EquityBelowAssetShare,
    /// Negative liability magnitude flipped to its absolute value.
    LiabilitySignFlip,
}

impl fmt::Display for RepairRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::TotalAssetsFromComponents => "total assets rebuilt from current + fixed assets",
            Self::EquityMissingOrNonPositive => "net assets missing or non-positive",
            Self::EquityBelowAssetShare => "net assets below minimum share of total assets",
            Self::LiabilitySignFlip => "negative liability sign-flipped",
        };
        f.write_str(text)
    }
}

/// One corrected field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RepairEvent {
    pub fiscal_year: Option<i32>,
    pub field: FinancialField,
    pub old_value: Option<f64>,
    pub new_value: f64,
    pub rule: RepairRule,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RepairOutcome {
    pub record: FilingRecord,
    pub events: Vec<RepairEvent>,
}

/// Rule-based correction of balance-sheet figures.
///
/// The steps run in a fixed order and each reads the output of the previous
/// one: total assets, then net assets, then liability signs. A step whose
/// operands are missing leaves its field alone. Input records are never
/// modified; callers get a repaired copy plus the list of changes.
pub struct ValueRepairEngine {
    config: RepairConfig,
}

impl ValueRepairEngine {
    pub fn new(config: RepairConfig) -> Self {
        Self { config }
    }

    pub fn repair_record(&self, record: &FilingRecord) -> RepairOutcome {
        let mut repaired = record.clone();
        let mut events = Vec::new();
        let fiscal_year = record.fiscal_year();

        if let Some((value, rule)) = total_assets_step(&repaired.figures) {
            apply(
                &mut repaired.figures,
                fiscal_year,
                FinancialField::TotalAssets,
                value,
                rule,
                &mut events,
            );
        }

        if let Some((value, rule)) = equity_step(&repaired.figures, self.config.min_equity_share) {
            apply(
                &mut repaired.figures,
                fiscal_year,
                FinancialField::NetAssets,
                value,
                rule,
                &mut events,
            );
        }

        for field in FinancialField::ALL.into_iter().filter(|f| f.is_liability()) {
            if let Some(value) = repaired.figures.get(field).filter(|v| *v < 0.0) {
                apply(
                    &mut repaired.figures,
                    fiscal_year,
                    field,
                    value.abs(),
                    RepairRule::LiabilitySignFlip,
                    &mut events,
                );
            }
        }

        RepairOutcome {
            record: repaired,
            events,
        }
    }

    /// Builds the repaired working copy of a series. Entry order is preserved.
    pub fn repair_series(&self, series: &AnnualSeries) -> (AnnualSeries, Vec<RepairEvent>) {
        let mut records = Vec::with_capacity(series.len());
        let mut events = Vec::new();

        for record in series {
            let outcome = self.repair_record(record);
            records.push(outcome.record);
            events.extend(outcome.events);
        }

        debug!(
            "Repair pass over {} annual filings produced {} corrections",
            series.len(),
            events.len()
        );

        (AnnualSeries::from_ordered(records), events)
    }
}

impl Default for ValueRepairEngine {
    fn default() -> Self {
        Self::new(RepairConfig::default())
    }
}

fn total_assets_step(figures: &FinancialFigures) -> Option<(f64, RepairRule)> {
    if positive(figures.total_assets).is_some() {
        return None;
    }
    let current = figures.current_assets?;
    let fixed = figures.fixed_assets?;
    Some((current + fixed, RepairRule::TotalAssetsFromComponents))
}

fn equity_step(figures: &FinancialFigures, min_equity_share: f64) -> Option<(f64, RepairRule)> {
    let total_assets = figures.total_assets?;
    let liabilities = figures.total_liabilities?;

    let rule = match positive(figures.net_assets) {
        None => RepairRule::EquityMissingOrNonPositive,
        Some(equity) if equity < total_assets * min_equity_share => {
            RepairRule::EquityBelowAssetShare
        }
        Some(_) => return None,
    };

    Some((total_assets - liabilities.abs(), rule))
}

fn apply(
    figures: &mut FinancialFigures,
    fiscal_year: Option<i32>,
    field: FinancialField,
    new_value: f64,
    rule: RepairRule,
    events: &mut Vec<RepairEvent>,
) {
    let old_value = figures.get(field);
    if old_value == Some(new_value) || !new_value.is_finite() {
        return;
    }

    info!(
        "FY{}: {} {:?} -> {} ({})",
        fiscal_year.map(|y| y.to_string()).unwrap_or_else(|| "?".to_string()),
        field,
        old_value,
        new_value,
        rule
    );

    figures.set(field, Some(new_value));
    events.push(RepairEvent {
        fiscal_year,
        field,
        old_value,
        new_value,
        rule,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DocumentType;
    use chrono::NaiveDate;

    fn annual(figures: FinancialFigures) -> FilingRecord {
        let mut record = FilingRecord::new(
            NaiveDate::from_ymd_opt(2024, 6, 27).unwrap(),
            DocumentType::AnnualReport,
            "",
        )
        .with_figures(figures);
        record.resolve_period();
        record
    }

    #[test]
    fn test_total_assets_rebuilt_from_components() {
        let record = annual(
            FinancialFigures::default()
                .with(FinancialField::CurrentAssets, 500.0)
                .with(FinancialField::FixedAssets, 300.0),
        );

        let outcome = ValueRepairEngine::default().repair_record(&record);
        assert_eq!(outcome.record.figures.total_assets, Some(800.0));
        assert_eq!(outcome.events.len(), 1);
        assert_eq!(outcome.events[0].rule, RepairRule::TotalAssetsFromComponents);
        assert_eq!(outcome.events[0].old_value, None);
        assert_eq!(outcome.events[0].fiscal_year, Some(2023));
    }

    #[test]
    fn test_total_assets_left_missing_without_both_components() {
        let record = annual(FinancialFigures::default().with(FinancialField::CurrentAssets, 500.0));

        let outcome = ValueRepairEngine::default().repair_record(&record);
        assert_eq!(outcome.record.figures.total_assets, None);
        assert!(outcome.events.is_empty());
    }

    #[test]
    fn test_negative_total_assets_replaced() {
        let record = annual(
            FinancialFigures::default()
                .with(FinancialField::TotalAssets, -1.0)
                .with(FinancialField::CurrentAssets, 500.0)
                .with(FinancialField::FixedAssets, 300.0),
        );

        let outcome = ValueRepairEngine::default().repair_record(&record);
        assert_eq!(outcome.record.figures.total_assets, Some(800.0));
        assert_eq!(outcome.events[0].old_value, Some(-1.0));
    }

    #[test]
    fn test_small_equity_recomputed_with_absolute_liabilities() {
        let record = annual(
            FinancialFigures::default()
                .with(FinancialField::TotalAssets, 1000.0)
                .with(FinancialField::TotalLiabilities, -400.0)
                .with(FinancialField::NetAssets, 50.0),
        );

        let outcome = ValueRepairEngine::default().repair_record(&record);
        let figures = &outcome.record.figures;
        assert_eq!(figures.net_assets, Some(600.0));
        assert_eq!(figures.total_liabilities, Some(400.0));

        let rules: Vec<RepairRule> = outcome.events.iter().map(|e| e.rule).collect();
        assert_eq!(
            rules,
            vec![RepairRule::EquityBelowAssetShare, RepairRule::LiabilitySignFlip]
        );
    }

    #[test]
    fn test_missing_equity_recomputed() {
        let record = annual(
            FinancialFigures::default()
                .with(FinancialField::TotalAssets, 1000.0)
                .with(FinancialField::TotalLiabilities, 300.0),
        );

        let outcome = ValueRepairEngine::default().repair_record(&record);
        assert_eq!(outcome.record.figures.net_assets, Some(700.0));
        assert_eq!(outcome.events[0].rule, RepairRule::EquityMissingOrNonPositive);
    }

    #[test]
    fn test_equity_reads_repaired_total_assets() {
        let record = annual(
            FinancialFigures::default()
                .with(FinancialField::CurrentAssets, 500.0)
                .with(FinancialField::FixedAssets, 300.0)
                .with(FinancialField::TotalLiabilities, 200.0)
                .with(FinancialField::NetAssets, 10.0),
        );

        let outcome = ValueRepairEngine::default().repair_record(&record);
        assert_eq!(outcome.record.figures.total_assets, Some(800.0));
        assert_eq!(outcome.record.figures.net_assets, Some(600.0));
    }

    #[test]
    fn test_equity_untouched_without_liabilities() {
        let record = annual(
            FinancialFigures::default()
                .with(FinancialField::TotalAssets, 1000.0)
                .with(FinancialField::NetAssets, 50.0),
        );

        let outcome = ValueRepairEngine::default().repair_record(&record);
        assert_eq!(outcome.record.figures.net_assets, Some(50.0));
        assert!(outcome.events.is_empty());
    }

    #[test]
    fn test_plausible_equity_untouched() {
        let record = annual(
            FinancialFigures::default()
                .with(FinancialField::TotalAssets, 1000.0)
                .with(FinancialField::TotalLiabilities, 400.0)
                .with(FinancialField::NetAssets, 550.0),
        );

        let outcome = ValueRepairEngine::default().repair_record(&record);
        assert_eq!(outcome.record.figures.net_assets, Some(550.0));
        assert!(outcome.events.is_empty());
    }

    #[test]
    fn test_all_liabilities_sign_normalized() {
        let record = annual(
            FinancialFigures::default()
                .with(FinancialField::TotalLiabilities, -400.0)
                .with(FinancialField::CurrentLiabilities, -250.0)
                .with(FinancialField::FixedLiabilities, -150.0),
        );

        let outcome = ValueRepairEngine::default().repair_record(&record);
        let figures = &outcome.record.figures;
        assert_eq!(figures.total_liabilities, Some(400.0));
        assert_eq!(figures.current_liabilities, Some(250.0));
        assert_eq!(figures.fixed_liabilities, Some(150.0));
        assert_eq!(outcome.events.len(), 3);
    }

    #[test]
    fn test_repair_is_idempotent() {
        let inputs = vec![
            FinancialFigures::default()
                .with(FinancialField::CurrentAssets, 500.0)
                .with(FinancialField::FixedAssets, 300.0)
                .with(FinancialField::TotalLiabilities, -400.0)
                .with(FinancialField::NetAssets, 5.0),
            // Liabilities exceed assets: the recomputed equity is negative and
            // stays below the share threshold on every pass.
            FinancialFigures::default()
                .with(FinancialField::TotalAssets, 1000.0)
                .with(FinancialField::TotalLiabilities, 1200.0)
                .with(FinancialField::NetAssets, 0.0),
            FinancialFigures::default()
                .with(FinancialField::TotalAssets, -10.0)
                .with(FinancialField::CurrentAssets, -5.0)
                .with(FinancialField::FixedAssets, -5.0),
        ];

        let engine = ValueRepairEngine::default();
        for figures in inputs {
            let once = engine.repair_record(&annual(figures));
            let twice = engine.repair_record(&once.record);
            assert_eq!(twice.record, once.record);
            assert!(twice.events.is_empty(), "second pass emitted {:?}", twice.events);
        }
    }

    #[test]
    fn test_raw_record_is_not_modified() {
        let record = annual(
            FinancialFigures::default()
                .with(FinancialField::TotalLiabilities, -400.0),
        );
        let snapshot = record.clone();

        let series = AnnualSeries::from_records(&[record.clone()]);
        let (repaired, events) = ValueRepairEngine::default().repair_series(&series);

        assert_eq!(record, snapshot);
        assert_eq!(series.records()[0].figures.total_liabilities, Some(-400.0));
        assert_eq!(repaired.records()[0].figures.total_liabilities, Some(400.0));
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_configurable_equity_share() {
        let record = annual(
            FinancialFigures::default()
                .with(FinancialField::TotalAssets, 1000.0)
                .with(FinancialField::TotalLiabilities, 400.0)
                .with(FinancialField::NetAssets, 150.0),
        );

        let default_outcome = ValueRepairEngine::default().repair_record(&record);
        assert_eq!(default_outcome.record.figures.net_assets, Some(150.0));

        let strict = ValueRepairEngine::new(RepairConfig {
            min_equity_share: 0.2,
        });
        let strict_outcome = strict.repair_record(&record);
        assert_eq!(strict_outcome.record.figures.net_assets, Some(600.0));
    }
}
