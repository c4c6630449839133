//! Forecast result types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{AggregatedBucket, Granularity};

/// Direction of projected spend relative to history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Increasing => "increasing",
            Self::Decreasing => "decreasing",
            Self::Stable => "stable",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a forecast fell back to a flat projection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum DegradedReason {
    /// No history at all; the projection uses the supplied baseline or zero
    EmptyHistory,
    /// Too few buckets to fit a trend
    InsufficientHistory { available: usize, required: usize },
}

impl fmt::Display for DegradedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyHistory => write!(f, "no spending history"),
            Self::InsufficientHistory {
                available,
                required,
            } => write!(
                f,
                "insufficient history ({} of {} buckets)",
                available, required
            ),
        }
    }
}

/// One projected bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// First day of the projected bucket
    pub date: NaiveDate,
    pub predicted_amount: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

/// Summary statistics over the projected points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSummary {
    pub total_forecasted: f64,
    /// Mean of predicted amounts normalized to a per-day rate
    pub mean_daily_expenditure: f64,
    /// Mean bucket total of the history (the baseline when history is empty)
    pub historical_mean: f64,
    /// `None` when the historical mean is zero
    pub percent_change_vs_historical: Option<f64>,
    pub forecast_periods: usize,
    pub confidence_description: String,
    pub trend: Trend,
    pub granularity: Granularity,
    /// Set when the projection is a flat fallback
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degraded: Option<DegradedReason>,
}

impl ForecastSummary {
    pub fn is_degraded(&self) -> bool {
        self.degraded.is_some()
    }
}

/// Inclusive range of history bucket start dates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Provenance of a forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastMetadata {
    pub historical_data_points: usize,
    pub historical_date_range: Option<DateRange>,
    pub granularity: Granularity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    /// Stamped by the caller; the engine never reads the clock
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<DateTime<Utc>>,
}

impl ForecastMetadata {
    pub fn from_history(history: &[AggregatedBucket], granularity: Granularity) -> Self {
        let historical_date_range = match (history.first(), history.last()) {
            (Some(first), Some(last)) => Some(DateRange {
                start: first.start,
                end: last.start,
            }),
            _ => None,
        };
        Self {
            historical_data_points: history.len(),
            historical_date_range,
            granularity,
            filter: None,
            generated_at: None,
        }
    }
}

/// Complete forecast: projected points, summary and provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    #[serde(rename = "forecast")]
    pub points: Vec<ForecastPoint>,
    pub summary: ForecastSummary,
    pub metadata: ForecastMetadata,
}

impl ForecastResult {
    /// Copy with every monetary and percentage figure rounded to cents
    ///
    /// Rounding happens once, at presentation; internal values keep full
    /// precision.
    pub fn rounded(&self) -> Self {
        let points = self
            .points
            .iter()
            .map(|p| ForecastPoint {
                date: p.date,
                predicted_amount: round2(p.predicted_amount),
                lower_bound: round2(p.lower_bound),
                upper_bound: round2(p.upper_bound),
            })
            .collect();

        let summary = ForecastSummary {
            total_forecasted: round2(self.summary.total_forecasted),
            mean_daily_expenditure: round2(self.summary.mean_daily_expenditure),
            historical_mean: round2(self.summary.historical_mean),
            percent_change_vs_historical: self.summary.percent_change_vs_historical.map(round2),
            ..self.summary.clone()
        };

        Self {
            points,
            summary,
            metadata: self.metadata.clone(),
        }
    }
}

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(672.0), 672.0);
        assert_eq!(round2(12.345678), 12.35);
        assert_eq!(round2(0.004), 0.0);
    }

    #[test]
    fn test_degraded_reason_serialization() {
        let json = serde_json::to_value(DegradedReason::InsufficientHistory {
            available: 3,
            required: 7,
        })
        .unwrap();
        assert_eq!(json["reason"], "insufficient_history");
        assert_eq!(json["available"], 3);

        let parsed: DegradedReason =
            serde_json::from_value(serde_json::json!({"reason": "empty_history"})).unwrap();
        assert_eq!(parsed, DegradedReason::EmptyHistory);
    }

    #[test]
    fn test_points_serialize_as_forecast() {
        let result = ForecastResult {
            points: vec![],
            summary: ForecastSummary {
                total_forecasted: 0.0,
                mean_daily_expenditure: 0.0,
                historical_mean: 0.0,
                percent_change_vs_historical: None,
                forecast_periods: 0,
                confidence_description: String::new(),
                trend: Trend::Stable,
                granularity: Granularity::Daily,
                degraded: None,
            },
            metadata: ForecastMetadata::from_history(&[], Granularity::Daily),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert!(json["forecast"].is_array());
        assert!(json["metadata"]["historical_date_range"].is_null());
        assert!(json["summary"].get("degraded").is_none());
    }
}
