//! HTTP client for the external analytics service

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::error::{Error, Result};
use crate::insights::InsightResult;

use super::types::{InsightRequest, PredictionRequest, PredictionResponse};
use super::AnalyticsBackend;

/// Talks JSON over HTTP to the analytics service
///
/// Endpoints:
/// - `GET /health`
/// - `POST /api/spending-forecast`
/// - `POST /api/analyze`
#[derive(Clone)]
pub struct HttpBackend {
    http_client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: serde::Serialize + ?Sized + Sync,
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .http_client
            .post(format!("{}{}", self.base_url, path))
            .timeout(self.timeout)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Upstream(format!(
                "{} returned HTTP {}",
                path, status
            )));
        }

        let body = response.text().await?;
        debug!(path, bytes = body.len(), "Analytics service response");
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl AnalyticsBackend for HttpBackend {
    async fn predict(&self, request: &PredictionRequest<'_>) -> Result<PredictionResponse> {
        self.post_json("/api/spending-forecast", request).await
    }

    async fn analyze(&self, request: &InsightRequest<'_>) -> Result<InsightResult> {
        self.post_json("/api/analyze", request).await
    }

    async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(format!("{}/health", self.base_url))
            .timeout(self.timeout)
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::types::PredictionRequest;
    use crate::models::{AggregatedBucket, BudgetState, Granularity};
    use crate::test_utils::MockAnalyticsServer;
    use chrono::NaiveDate;

    fn history() -> Vec<AggregatedBucket> {
        (0..4)
            .map(|i| {
                let start = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap() + chrono::Duration::weeks(i);
                AggregatedBucket {
                    period_label: Granularity::Weekly.label(start),
                    start,
                    total_amount: 100.0,
                    count: 2,
                }
            })
            .collect()
    }

    #[tokio::test]
    async fn test_predict_against_mock_server() {
        let server = MockAnalyticsServer::start().await;
        let backend = HttpBackend::new(&server.url(), Duration::from_secs(5));

        assert!(backend.health_check().await);

        let history = history();
        let request = PredictionRequest::new(None, &history, Granularity::Weekly);
        let response = backend.predict(&request).await.unwrap();
        let points = response.into_points(4).unwrap();
        assert_eq!(points.len(), 4);
        assert_eq!(points[0].date, NaiveDate::from_ymd_opt(2025, 9, 29).unwrap());
        assert_eq!(points[0].predicted_amount, 100.0);
    }

    #[tokio::test]
    async fn test_analyze_against_mock_server() {
        let server = MockAnalyticsServer::start().await;
        let backend = HttpBackend::new(&format!("{}/", server.url()), Duration::from_secs(5));

        let state = BudgetState {
            name: "Quinn".to_string(),
            budget_total: 3175.0,
            budget_spent: 4288.62,
            meal_credits_total: 161,
            meal_credits_used: 105,
            flex_total: 800.0,
            flex_spent: 680.0,
            weeks_remaining: 8,
            preferences: None,
        };
        let request = InsightRequest {
            user_data: &state,
            transactions: &[],
        };
        let result = backend.analyze(&request).await.unwrap();
        assert!(result.headline.contains("Quinn"));
    }

    #[tokio::test]
    async fn test_error_status_is_upstream_error() {
        let server = MockAnalyticsServer::start_failing().await;
        let backend = HttpBackend::new(&server.url(), Duration::from_secs(5));

        assert!(!backend.health_check().await);

        let history = history();
        let request = PredictionRequest::new(None, &history, Granularity::Weekly);
        let err = backend.predict(&request).await.unwrap_err();
        assert!(matches!(err, Error::Upstream(_)));
        assert!(err.is_upstream());
    }

    #[tokio::test]
    async fn test_unreachable_host() {
        let backend = HttpBackend::new("http://127.0.0.1:9", Duration::from_millis(500));
        assert!(!backend.health_check().await);

        let history = history();
        let request = PredictionRequest::new(None, &history, Granularity::Weekly);
        let err = backend.predict(&request).await.unwrap_err();
        assert!(err.is_upstream());
    }
}
