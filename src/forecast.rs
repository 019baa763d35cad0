use crate::error::{FilingAnalysisError, Result};
use log::{debug, info};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Straight-line revenue trend: `revenue = intercept + slope * year`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TrendLine {
    #[schemars(description = "Revenue change per fiscal year.")]
    pub slope: f64,
    pub intercept: f64,
}

impl TrendLine {
    pub fn predict(&self, fiscal_year: i32) -> f64 {
        self.intercept + self.slope * fiscal_year as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct YearValue {
    pub fiscal_year: i32,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RevenueForecast {
    pub trend: TrendLine,
    pub r_squared: f64,
    pub rmse: f64,
    pub observations: usize,
    pub fitted: Vec<YearValue>,
    pub projections: Vec<YearValue>,
}

/// Longest projection `fit_revenue_trend` accepts, in fiscal years.
pub const MAX_FORECAST_HORIZON: usize = 100;

/// Least-squares fit over `(fiscal year, revenue)` points, projected
/// `horizon` years past the last observed year.
pub fn fit_revenue_trend(points: &[(i32, f64)], horizon: usize) -> Result<RevenueForecast> {
    let horizon = i32::try_from(horizon)
        .ok()
        .filter(|h| *h as usize <= MAX_FORECAST_HORIZON)
        .ok_or_else(|| {
            FilingAnalysisError::InvalidConfig(format!(
                "forecast horizon must be at most {} years, got {}",
                MAX_FORECAST_HORIZON, horizon
            ))
        })?;

    let points: Vec<(i32, f64)> = points
        .iter()
        .copied()
        .filter(|(_, revenue)| revenue.is_finite())
        .collect();

    if points.len() < 2 {
        return Err(FilingAnalysisError::InsufficientData(format!(
            "revenue trend needs at least 2 fiscal years, got {}",
            points.len()
        )));
    }

    let n = points.len() as f64;
    let x_mean = points.iter().map(|(x, _)| *x as f64).sum::<f64>() / n;
    let y_mean = points.iter().map(|(_, y)| *y).sum::<f64>() / n;

    let mut ss_xy = 0.0;
    let mut ss_xx = 0.0;
    let mut ss_yy = 0.0;
    for (x, y) in &points {
        let dx = *x as f64 - x_mean;
        let dy = y - y_mean;
        ss_xy += dx * dy;
        ss_xx += dx * dx;
        ss_yy += dy * dy;
    }

    if ss_xx < 1e-12 {
        return Err(FilingAnalysisError::InsufficientData(
            "revenue trend needs at least 2 distinct fiscal years".to_string(),
        ));
    }

    let slope = ss_xy / ss_xx;
    let trend = TrendLine {
        slope,
        intercept: y_mean - slope * x_mean,
    };

    let fitted: Vec<YearValue> = points
        .iter()
        .map(|(year, _)| YearValue {
            fiscal_year: *year,
            value: trend.predict(*year),
        })
        .collect();

    let ss_res: f64 = points
        .iter()
        .zip(&fitted)
        .map(|((_, actual), predicted)| (actual - predicted.value).powi(2))
        .sum();

    // A flat series is fitted exactly by a flat line.
    let r_squared = if ss_yy > 1e-12 { 1.0 - ss_res / ss_yy } else { 1.0 };
    let rmse = (ss_res / n).sqrt();

    let last_year = points.iter().map(|(year, _)| *year).max().unwrap_or_default();
    let projections: Vec<YearValue> = (1..=horizon)
        .map(|offset| YearValue {
            fiscal_year: last_year + offset,
            value: trend.predict(last_year + offset),
        })
        .collect();

    debug!(
        "Revenue trend over {} years: slope {:.2}, intercept {:.2}",
        points.len(),
        trend.slope,
        trend.intercept
    );
    info!(
        "Revenue trend fitted: R² {:.4}, RMSE {:.0}, {} projected years",
        r_squared,
        rmse,
        projections.len()
    );

    Ok(RevenueForecast {
        trend,
        r_squared,
        rmse,
        observations: points.len(),
        fitted,
        projections,
    })
}
