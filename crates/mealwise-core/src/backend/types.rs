//! Wire types for the external analytics service

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::forecast::ForecastPoint;
use crate::insights::InsightResult;
use crate::models::{AggregatedBucket, BudgetState, Granularity, TransactionRecord};

/// User fields the prediction service needs
#[derive(Debug, Clone, Serialize)]
pub struct PredictionUserData<'a> {
    pub name: &'a str,
    pub total_budget: f64,
}

/// Body of `POST /api/spending-forecast`
#[derive(Debug, Clone, Serialize)]
pub struct PredictionRequest<'a> {
    #[serde(rename = "userData")]
    pub user_data: PredictionUserData<'a>,
    pub transactions: &'a [AggregatedBucket],
    pub mode: Granularity,
}

impl<'a> PredictionRequest<'a> {
    pub fn new(
        state: Option<&'a BudgetState>,
        history: &'a [AggregatedBucket],
        mode: Granularity,
    ) -> Self {
        Self {
            user_data: PredictionUserData {
                name: state.map(|s| s.name.as_str()).unwrap_or(""),
                total_budget: state.map(|s| s.budget_total).unwrap_or(0.0),
            },
            transactions: history,
            mode,
        }
    }
}

/// One point as returned by the service; every field is checked before use
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawForecastPoint {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default, alias = "predictedAmount")]
    pub predicted_amount: Option<f64>,
    #[serde(default, alias = "lowerBound")]
    pub lower_bound: Option<f64>,
    #[serde(default, alias = "upperBound")]
    pub upper_bound: Option<f64>,
}

/// Response of `POST /api/spending-forecast`
///
/// The service's own summary is ignored; it is recomputed locally from the
/// sanitized points.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PredictionResponse {
    #[serde(default)]
    pub forecast: Vec<RawForecastPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<serde_json::Value>,
}

impl PredictionResponse {
    /// Validate and clamp the service's points
    ///
    /// Missing or unparseable fields are malformed. Negative values are
    /// clamped to zero and bounds are reordered around the prediction so
    /// that `0 <= lower <= predicted <= upper` always holds. Fewer than
    /// `horizon` points is malformed; extra points are dropped.
    pub fn into_points(self, horizon: usize) -> Result<Vec<ForecastPoint>> {
        if self.forecast.len() < horizon {
            return Err(Error::Upstream(format!(
                "prediction service returned {} points, expected {}",
                self.forecast.len(),
                horizon
            )));
        }

        self.forecast
            .into_iter()
            .take(horizon)
            .enumerate()
            .map(|(i, raw)| sanitize_point(i, raw))
            .collect()
    }
}

fn sanitize_point(index: usize, raw: RawForecastPoint) -> Result<ForecastPoint> {
    let malformed = |what: &str| {
        Error::Upstream(format!("forecast point {} has {}", index, what))
    };

    let date = raw
        .date
        .as_deref()
        .and_then(parse_service_date)
        .ok_or_else(|| malformed("no valid date"))?;

    let value = |v: Option<f64>, field: &str| match v {
        Some(v) if v.is_finite() => Ok(v.max(0.0)),
        _ => Err(malformed(&format!("an invalid {}", field))),
    };
    let predicted = value(raw.predicted_amount, "predicted_amount")?;
    let lower = value(raw.lower_bound, "lower_bound")?;
    let upper = value(raw.upper_bound, "upper_bound")?;

    Ok(ForecastPoint {
        date,
        predicted_amount: predicted,
        lower_bound: lower.min(predicted),
        upper_bound: upper.max(predicted),
    })
}

/// Dates arrive as `YYYY-MM-DD`, optionally followed by a time part
fn parse_service_date(s: &str) -> Option<NaiveDate> {
    let day = s.trim().get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Body of `POST /api/analyze`
#[derive(Debug, Clone, Serialize)]
pub struct InsightRequest<'a> {
    pub user_data: &'a BudgetState,
    pub transactions: &'a [TransactionRecord],
}

/// Validate an insight returned by the service
pub fn sanitize_insight(mut result: InsightResult) -> Result<InsightResult> {
    if result.headline.trim().is_empty() {
        return Err(Error::Upstream(
            "insight service returned an empty headline".to_string(),
        ));
    }
    if !result.headline_amount.is_finite() || result.headline_amount < 0.0 {
        return Err(Error::Upstream(format!(
            "insight service returned an invalid amount: {}",
            result.headline_amount
        )));
    }
    result.patterns.retain(|p| !p.trim().is_empty());
    result.rule = None;
    Ok(result)
}
