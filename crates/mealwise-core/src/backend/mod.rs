//! External analytics service boundary
//!
//! The forecast and insight engines are complete on their own; an external
//! analytics service is an optional alternate implementation. This module
//! defines its interface so tests can substitute deterministic fakes.
//!
//! # Architecture
//!
//! - `AnalyticsBackend` trait: prediction, insight and health calls
//! - `BackendClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Implementations: `HttpBackend`, `MockBackend`
//!
//! # Usage
//!
//! ```rust,ignore
//! let backend = BackendClient::from_config(&config.backend);
//!
//! if let Some(ref client) = backend {
//!     let response = client.predict(&request).await?;
//!     let points = response.into_points(4)?;
//! }
//! ```
//!
//! Callers own timeouts, retries and fallback; see `pipeline`.

mod http;
mod mock;
pub mod types;

pub use http::HttpBackend;
pub use mock::{MockBackend, MockBehavior};
pub use types::{
    sanitize_insight, InsightRequest, PredictionRequest, PredictionResponse, PredictionUserData,
    RawForecastPoint,
};

use async_trait::async_trait;

use crate::config::BackendConfig;
use crate::error::Result;
use crate::insights::InsightResult;

/// Interface of the external analytics service
#[async_trait]
pub trait AnalyticsBackend: Send + Sync {
    /// Forecast future spend from aggregated history
    async fn predict(&self, request: &PredictionRequest<'_>) -> Result<PredictionResponse>;

    /// Derive an insight from a budget snapshot and transactions
    async fn analyze(&self, request: &InsightRequest<'_>) -> Result<InsightResult>;

    /// Check if the service is reachable
    async fn health_check(&self) -> bool;

    /// Where the service lives (URL, or "mock")
    fn host(&self) -> &str;
}

/// Concrete analytics backend
#[derive(Clone)]
pub enum BackendClient {
    /// JSON over HTTP
    Http(HttpBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl BackendClient {
    /// Create a client from configuration
    ///
    /// Returns None when no backend URL is configured; `mock` selects the
    /// mock backend.
    pub fn from_config(config: &BackendConfig) -> Option<Self> {
        let url = config.url.as_deref()?.trim();
        if url.eq_ignore_ascii_case("mock") {
            return Some(Self::mock());
        }
        Some(Self::http(url, config.timeout))
    }

    pub fn http(base_url: &str, timeout: std::time::Duration) -> Self {
        BackendClient::Http(HttpBackend::new(base_url, timeout))
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        BackendClient::Mock(MockBackend::new())
    }
}

// Delegate to the inner backend
#[async_trait]
impl AnalyticsBackend for BackendClient {
    async fn predict(&self, request: &PredictionRequest<'_>) -> Result<PredictionResponse> {
        match self {
            BackendClient::Http(b) => b.predict(request).await,
            BackendClient::Mock(b) => b.predict(request).await,
        }
    }

    async fn analyze(&self, request: &InsightRequest<'_>) -> Result<InsightResult> {
        match self {
            BackendClient::Http(b) => b.analyze(request).await,
            BackendClient::Mock(b) => b.analyze(request).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            BackendClient::Http(b) => b.health_check().await,
            BackendClient::Mock(b) => b.health_check().await,
        }
    }

    fn host(&self) -> &str {
        match self {
            BackendClient::Http(b) => b.host(),
            BackendClient::Mock(b) => b.host(),
        }
    }
}
