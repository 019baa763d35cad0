use crate::error::{FilingAnalysisError, Result};
use crate::forecast::MAX_FORECAST_HORIZON;
use crate::ratios::{RatioConfig, RatioMode};
use crate::repair::RepairConfig;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Tunable thresholds and switches for one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AnalysisConfig {
    #[schemars(description = "Compute ratios on repaired figures (default) or on the filings as read.")]
    pub ratio_mode: RatioMode,

    pub repair: RepairConfig,

    pub ratios: RatioConfig,

    #[schemars(description = "Number of fiscal years projected past the last observed year, 1 to 100.")]
    pub forecast_horizon: usize,

    #[schemars(description = "Prefix CSV output with a UTF-8 byte order mark so spreadsheet tools detect the encoding.")]
    pub csv_bom: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            ratio_mode: RatioMode::Repaired,
            repair: RepairConfig::default(),
            ratios: RatioConfig::default(),
            forecast_horizon: 5,
            csv_bom: true,
        }
    }
}

impl AnalysisConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        let share = self.repair.min_equity_share;
        if !share.is_finite() || !(0.0..1.0).contains(&share) {
            return Err(FilingAnalysisError::InvalidConfig(format!(
                "repair.min_equity_share must be in [0, 1), got {}",
                share
            )));
        }

        let floor = self.ratios.roe_equity_floor;
        if !floor.is_finite() || floor < 0.0 {
            return Err(FilingAnalysisError::InvalidConfig(format!(
                "ratios.roe_equity_floor must be a non-negative amount, got {}",
                floor
            )));
        }

        let cap = self.ratios.roe_cap;
        if !cap.is_finite() || cap <= 0.0 {
            return Err(FilingAnalysisError::InvalidConfig(format!(
                "ratios.roe_cap must be positive, got {}",
                cap
            )));
        }

        if !(1..=MAX_FORECAST_HORIZON).contains(&self.forecast_horizon) {
            return Err(FilingAnalysisError::InvalidConfig(format!(
                "forecast_horizon must be between 1 and {}, got {}",
                MAX_FORECAST_HORIZON, self.forecast_horizon
            )));
        }

        Ok(())
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(AnalysisConfig)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds() {
        let config = AnalysisConfig::default();
        assert_eq!(config.ratio_mode, RatioMode::Repaired);
        assert_eq!(config.repair.min_equity_share, 0.1);
        assert_eq!(config.ratios.roe_equity_floor, 10_000_000_000.0);
        assert_eq!(config.ratios.roe_cap, 50.0);
        assert_eq!(config.forecast_horizon, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = AnalysisConfig::from_json_str(
            r#"{ "ratio_mode": "raw", "ratios": { "roe_equity_floor": 0.0, "roe_cap": 40.0 } }"#,
        )
        .unwrap();

        assert_eq!(config.ratio_mode, RatioMode::Raw);
        assert_eq!(config.ratios.roe_cap, 40.0);
        assert_eq!(config.repair.min_equity_share, 0.1);
        assert_eq!(config.forecast_horizon, 5);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let bad_share = AnalysisConfig::from_json_str(r#"{ "repair": { "min_equity_share": 1.5 } }"#);
        assert!(matches!(bad_share, Err(FilingAnalysisError::InvalidConfig(_))));

        let bad_horizon = AnalysisConfig::from_json_str(r#"{ "forecast_horizon": 0 }"#);
        assert!(matches!(bad_horizon, Err(FilingAnalysisError::InvalidConfig(_))));

        let huge_horizon =
            AnalysisConfig::from_json_str(r#"{ "forecast_horizon": 4294967298 }"#);
        assert!(matches!(huge_horizon, Err(FilingAnalysisError::InvalidConfig(_))));

        let mut config = AnalysisConfig::default();
        config.ratios.roe_cap = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_json_is_serialization_error() {
        let result = AnalysisConfig::from_json_str("{ not json");
        assert!(matches!(result, Err(FilingAnalysisError::SerializationError(_))));
    }

    #[test]
    fn test_schema_generation() {
        let schema_json = AnalysisConfig::schema_as_json().unwrap();
        assert!(schema_json.contains("ratio_mode"));
        assert!(schema_json.contains("roe_equity_floor"));
        assert!(schema_json.contains("min_equity_share"));
    }
}
