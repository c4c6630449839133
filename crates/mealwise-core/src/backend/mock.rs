//! Mock backend for testing
//!
//! Produces predictable responses without a running analytics service, and
//! can be told to fail, stall or return malformed data to exercise the
//! fallback paths.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::aggregate::mean_total;
use crate::error::{Error, Result};
use crate::insights::{InsightKind, InsightResult};

use super::types::{InsightRequest, PredictionRequest, PredictionResponse, RawForecastPoint};
use super::AnalyticsBackend;

/// How the mock responds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MockBehavior {
    /// Well-formed responses
    #[default]
    Respond,
    /// Every call fails
    Fail,
    /// Responses parse but fail validation
    Malformed,
    /// Responds correctly after a delay
    Slow(Duration),
}

/// Mock analytics backend
///
/// Clones share a call counter, so tests can assert on retry behavior.
#[derive(Clone, Default)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
    pub behavior: MockBehavior,
    calls: Arc<AtomicUsize>,
}

impl MockBackend {
    /// Create a new mock backend (healthy by default)
    pub fn new() -> Self {
        Self {
            healthy: true,
            ..Self::default()
        }
    }

    /// Create an unhealthy mock backend whose calls all fail
    pub fn unhealthy() -> Self {
        Self::with_behavior(MockBehavior::Fail)
    }

    /// Create a mock returning responses that fail validation
    pub fn malformed() -> Self {
        Self::with_behavior(MockBehavior::Malformed)
    }

    /// Create a mock that answers after `delay`
    pub fn slow(delay: Duration) -> Self {
        Self::with_behavior(MockBehavior::Slow(delay))
    }

    pub fn with_behavior(behavior: MockBehavior) -> Self {
        Self {
            healthy: behavior != MockBehavior::Fail,
            behavior,
            calls: Arc::default(),
        }
    }

    /// Number of predict/analyze calls made so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Count the call and apply failure or delay behavior
    async fn begin(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            MockBehavior::Fail => Err(Error::Upstream("mock backend unavailable".to_string())),
            MockBehavior::Slow(delay) => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
            MockBehavior::Respond | MockBehavior::Malformed => Ok(()),
        }
    }
}

#[async_trait]
impl AnalyticsBackend for MockBackend {
    async fn predict(&self, request: &PredictionRequest<'_>) -> Result<PredictionResponse> {
        self.begin().await?;

        let history = request.transactions;
        let last = history
            .last()
            .ok_or_else(|| Error::Upstream("no history to forecast from".to_string()))?;

        if self.behavior == MockBehavior::Malformed {
            return Ok(PredictionResponse {
                forecast: vec![RawForecastPoint {
                    date: Some("not-a-date".to_string()),
                    ..RawForecastPoint::default()
                }],
                summary: None,
            });
        }

        // Flat projection of the mean with a ±10% band
        let mean = mean_total(history).unwrap_or(0.0);
        let mut forecast = Vec::new();
        let mut date = last.start;
        for _ in 0..request.mode.default_horizon() {
            date = request
                .mode
                .next_start(date)
                .ok_or_else(|| Error::Upstream("date overflow".to_string()))?;
            forecast.push(RawForecastPoint {
                date: Some(date.format("%Y-%m-%d").to_string()),
                predicted_amount: Some(mean),
                lower_bound: Some(mean * 0.9),
                upper_bound: Some(mean * 1.1),
            });
        }

        Ok(PredictionResponse {
            forecast,
            summary: None,
        })
    }

    async fn analyze(&self, request: &InsightRequest<'_>) -> Result<InsightResult> {
        self.begin().await?;

        if self.behavior == MockBehavior::Malformed {
            return Ok(InsightResult::new(InsightKind::OnTrack, String::new(), f64::NAN));
        }

        let state = request.user_data;
        Ok(InsightResult {
            headline: format!("Mock analysis for {}", state.name),
            headline_amount: state.budget_spent,
            patterns: vec![format!("{} transactions reviewed", request.transactions.len())],
            recommendation: "Keep tracking your spending".to_string(),
            rule: None,
        })
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn host(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::types::sanitize_insight;
    use crate::models::{AggregatedBucket, BudgetState, Granularity};
    use chrono::NaiveDate;

    fn history() -> Vec<AggregatedBucket> {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        vec![AggregatedBucket {
            period_label: Granularity::Monthly.label(start),
            start,
            total_amount: 300.0,
            count: 10,
        }]
    }

    #[tokio::test]
    async fn test_respond() {
        let mock = MockBackend::new();
        let history = history();
        let request = PredictionRequest::new(None, &history, Granularity::Monthly);
        let points = mock.predict(&request).await.unwrap().into_points(3).unwrap();

        assert_eq!(points[0].date, NaiveDate::from_ymd_opt(2025, 2, 1).unwrap());
        assert_eq!(points[2].date, NaiveDate::from_ymd_opt(2025, 4, 1).unwrap());
        assert!((points[1].upper_bound - 330.0).abs() < 1e-9);
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_fail_and_malformed() {
        let history = history();
        let request = PredictionRequest::new(None, &history, Granularity::Monthly);

        let failing = MockBackend::unhealthy();
        assert!(!failing.health_check().await);
        assert!(failing.predict(&request).await.is_err());

        let malformed = MockBackend::malformed();
        let response = malformed.predict(&request).await.unwrap();
        assert!(response.into_points(3).is_err());

        let state = BudgetState {
            name: "x".to_string(),
            budget_total: 1.0,
            budget_spent: 1.0,
            meal_credits_total: 1,
            meal_credits_used: 1,
            flex_total: 1.0,
            flex_spent: 1.0,
            weeks_remaining: 1,
            preferences: None,
        };
        let insight = malformed
            .analyze(&InsightRequest {
                user_data: &state,
                transactions: &[],
            })
            .await
            .unwrap();
        assert!(sanitize_insight(insight).is_err());
    }

    #[tokio::test]
    async fn test_clones_share_call_counter() {
        let mock = MockBackend::unhealthy();
        let clone = mock.clone();
        let history = history();
        let request = PredictionRequest::new(None, &history, Granularity::Monthly);
        let _ = clone.predict(&request).await;
        let _ = clone.predict(&request).await;
        assert_eq!(mock.calls(), 2);
    }
}
