//! Analysis pipeline
//!
//! raw transactions + budget snapshot -> normalize -> aggregate ->
//! {forecast, insights}
//!
//! The optional analytics backend is tried first, bounded by a timeout and
//! at most one retry. Any backend failure, including a malformed response,
//! falls back to the local engines; results carry a [`ResultSource`] so
//! callers can show an "estimated" indicator.

use std::future::Future;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::aggregate::SeriesAggregator;
use crate::backend::{
    sanitize_insight, AnalyticsBackend, BackendClient, InsightRequest, PredictionRequest,
};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::forecast::{ForecastEngine, ForecastMetadata, ForecastOptions, ForecastResult};
use crate::insights::{InsightContext, InsightEngine, InsightResult};
use crate::models::{AggregatedBucket, BudgetState, Granularity, TransactionRecord};
use crate::normalize::{SkippedRecord, TransactionFilter, TransactionNormalizer};

/// Where a result came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSource {
    /// Local engines; no backend configured
    Local,
    /// The external analytics backend
    Backend,
    /// Local engines after the backend failed
    LocalFallback,
}

impl ResultSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultSource::Local => "local",
            ResultSource::Backend => "backend",
            ResultSource::LocalFallback => "local_fallback",
        }
    }

    /// Whether the caller should flag the result as estimated
    pub fn is_fallback(&self) -> bool {
        matches!(self, ResultSource::LocalFallback)
    }
}

/// Inputs for a forecast run
#[derive(Debug, Clone)]
pub struct ForecastRequest {
    pub transactions: Vec<Value>,
    /// Supplies the backend's user fields and the empty-history baseline
    pub state: Option<BudgetState>,
    pub granularity: Granularity,
    /// Defaults to the granularity's horizon; at most [`crate::MAX_HORIZON`]
    pub horizon: Option<usize>,
    pub filter: Option<TransactionFilter>,
}

impl ForecastRequest {
    pub fn new(transactions: Vec<Value>, granularity: Granularity) -> Self {
        Self {
            transactions,
            state: None,
            granularity,
            horizon: None,
            filter: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ForecastOutcome {
    pub result: ForecastResult,
    pub source: ResultSource,
    pub skipped: Vec<SkippedRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InsightOutcome {
    pub result: InsightResult,
    pub source: ResultSource,
    pub skipped: Vec<SkippedRecord>,
    /// Weekly history the local rules saw
    pub history: Vec<AggregatedBucket>,
}

/// Forecast and insights from one normalization pass
#[derive(Debug, Clone, Serialize)]
pub struct DashboardOutcome {
    pub forecast: ForecastOutcome,
    pub insights: InsightOutcome,
}

/// Composes normalizer, aggregator and both engines with an optional backend
pub struct BudgetAnalyzer {
    config: Config,
    normalizer: TransactionNormalizer,
    aggregator: SeriesAggregator,
    forecaster: ForecastEngine,
    insights: InsightEngine,
    backend: Option<BackendClient>,
}

impl BudgetAnalyzer {
    /// Build the pipeline; the backend comes from `config.backend`
    pub fn new(config: Config) -> Result<Self> {
        let backend = BackendClient::from_config(&config.backend);
        Ok(Self {
            normalizer: TransactionNormalizer::new(config.utc_offset)?,
            aggregator: SeriesAggregator::new(config.utc_offset),
            forecaster: ForecastEngine::new(config.forecast.clone()),
            insights: InsightEngine::from_config(&config),
            backend,
            config,
        })
    }

    /// Replace the backend (None keeps everything local)
    pub fn with_backend(mut self, backend: Option<BackendClient>) -> Self {
        self.backend = backend;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn backend(&self) -> Option<&BackendClient> {
        self.backend.as_ref()
    }

    pub fn normalizer(&self) -> &TransactionNormalizer {
        &self.normalizer
    }

    pub fn insight_engine(&self) -> &InsightEngine {
        &self.insights
    }

    /// Normalize, filter, aggregate and forecast
    pub async fn forecast(&self, request: &ForecastRequest) -> Result<ForecastOutcome> {
        if let Some(state) = &request.state {
            state.validate(self.config.credits.period_weeks)?;
        }
        let batch = self.normalizer.normalize(&request.transactions);
        let (result, source) = self
            .forecast_records(
                batch.records,
                request.state.as_ref(),
                request.granularity,
                request.horizon,
                request.filter.as_ref(),
            )
            .await?;
        Ok(ForecastOutcome {
            result,
            source,
            skipped: batch.skipped,
        })
    }

    /// Normalize, aggregate weekly and derive insights
    pub async fn insights(
        &self,
        state: &BudgetState,
        transactions: &[Value],
    ) -> Result<InsightOutcome> {
        state.validate(self.config.credits.period_weeks)?;
        let batch = self.normalizer.normalize(transactions);
        let (result, source, history) = self.insight_records(state, &batch.records).await;
        Ok(InsightOutcome {
            result,
            source,
            skipped: batch.skipped,
            history,
        })
    }

    /// Forecast and insights concurrently over one normalization pass
    pub async fn dashboard(
        &self,
        state: &BudgetState,
        transactions: &[Value],
        granularity: Granularity,
        filter: Option<&TransactionFilter>,
    ) -> Result<DashboardOutcome> {
        state.validate(self.config.credits.period_weeks)?;
        let batch = self.normalizer.normalize(transactions);

        let (forecast, insights) = tokio::join!(
            self.forecast_records(batch.records.clone(), Some(state), granularity, None, filter),
            self.insight_records(state, &batch.records)
        );
        let (result, source) = forecast?;
        let (insight, insight_source, history) = insights;

        Ok(DashboardOutcome {
            forecast: ForecastOutcome {
                result,
                source,
                skipped: batch.skipped.clone(),
            },
            insights: InsightOutcome {
                result: insight,
                source: insight_source,
                skipped: batch.skipped,
                history,
            },
        })
    }

    async fn forecast_records(
        &self,
        records: Vec<TransactionRecord>,
        state: Option<&BudgetState>,
        granularity: Granularity,
        horizon: Option<usize>,
        filter: Option<&TransactionFilter>,
    ) -> Result<(ForecastResult, ResultSource)> {
        let records = match filter {
            Some(filter) => filter.apply(records),
            None => records,
        };
        let history = self.aggregator.aggregate(&records, granularity);
        let today = Utc::now().with_timezone(&self.config.utc_offset).date_naive();

        let mut options = ForecastOptions::new(granularity).with_anchor(today);
        if let Some(horizon) = horizon {
            options = options.with_horizon(horizon);
        }
        if history.is_empty() {
            if let Some(baseline) = state.and_then(|s| self.pace_baseline(s, granularity, today)) {
                options = options.with_fallback_mean(baseline);
            }
        }

        // The wire format has no horizon field, so only default horizons go upstream
        let mut source = ResultSource::Local;
        if let Some(backend) = &self.backend {
            if !history.is_empty() && options.horizon == granularity.default_horizon() {
                match self.backend_forecast(backend, state, &history, &options).await {
                    Ok(result) => {
                        return Ok((stamp(result, filter), ResultSource::Backend));
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Prediction service failed, forecasting locally");
                        source = ResultSource::LocalFallback;
                    }
                }
            }
        }

        let result = self.forecaster.forecast(&history, &options)?;
        tracing::info!(
            granularity = granularity.as_str(),
            source = source.as_str(),
            history = history.len(),
            "Forecast ready"
        );
        Ok((stamp(result, filter), source))
    }

    async fn backend_forecast(
        &self,
        backend: &BackendClient,
        state: Option<&BudgetState>,
        history: &[AggregatedBucket],
        options: &ForecastOptions,
    ) -> Result<ForecastResult> {
        let request = PredictionRequest::new(state, history, options.granularity);
        let horizon = options.horizon;
        let request = &request;

        let points = self
            .call_with_retry("predict", move || async move {
                backend.predict(request).await?.into_points(horizon)
            })
            .await?;

        let summary = self.forecaster.summarize(
            history,
            &points,
            options.granularity,
            None,
            "prediction service interval".to_string(),
            None,
        );
        Ok(ForecastResult {
            points,
            summary,
            metadata: ForecastMetadata::from_history(history, options.granularity),
        })
    }

    async fn insight_records(
        &self,
        state: &BudgetState,
        records: &[TransactionRecord],
    ) -> (InsightResult, ResultSource, Vec<AggregatedBucket>) {
        let history = self.aggregator.aggregate(records, Granularity::Weekly);

        let mut source = ResultSource::Local;
        if let Some(backend) = &self.backend {
            let request = InsightRequest {
                user_data: state,
                transactions: records,
            };
            let request = &request;
            match self
                .call_with_retry("analyze", move || async move {
                    sanitize_insight(backend.analyze(request).await?)
                })
                .await
            {
                Ok(result) => return (result, ResultSource::Backend, history),
                Err(e) => {
                    tracing::warn!(error = %e, "Insight service failed, using local rules");
                    source = ResultSource::LocalFallback;
                }
            }
        }

        let ctx = InsightContext::new(state, &history).with_transactions(records);
        let result = self.insights.evaluate(&ctx);
        tracing::info!(
            rule = result.rule.map(|r| r.as_str()).unwrap_or("none"),
            source = source.as_str(),
            "Insights ready"
        );
        (result, source, history)
    }

    /// Per-bucket spend implied by the state's weekly pace
    fn pace_baseline(
        &self,
        state: &BudgetState,
        granularity: Granularity,
        today: NaiveDate,
    ) -> Option<f64> {
        let pace = state.weekly_pace(self.config.credits.period_weeks)?;
        let days = granularity.days_in_bucket(granularity.bucket_start(today));
        Some(pace * days as f64 / 7.0)
    }

    /// Run a backend call under the configured timeout, retrying at most once
    ///
    /// Only upstream failures are retried; anything else fails fast.
    async fn call_with_retry<T, F, Fut>(&self, operation: &str, mut call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let timeout = self.config.backend.timeout;
        let attempts = 1 + self.config.backend.max_retries.min(1);
        let mut last_error = Error::Upstream(format!("{} was not attempted", operation));

        for attempt in 1..=attempts {
            match tokio::time::timeout(timeout, call()).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(e)) => {
                    let retryable = e.is_upstream();
                    tracing::warn!(operation, attempt, retryable, error = %e, "Backend call failed");
                    last_error = e;
                    if !retryable {
                        break;
                    }
                }
                Err(_) => {
                    tracing::warn!(operation, attempt, ?timeout, "Backend call timed out");
                    last_error = Error::Timeout(timeout);
                }
            }
        }

        Err(last_error)
    }
}

/// Attach caller-side provenance
fn stamp(mut result: ForecastResult, filter: Option<&TransactionFilter>) -> ForecastResult {
    result.metadata.filter = filter.map(|f| f.describe());
    result.metadata.generated_at = Some(Utc::now());
    result
}
