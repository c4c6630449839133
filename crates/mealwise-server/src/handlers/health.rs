//! Health and service info

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;
use mealwise_core::AnalyticsBackend;

#[derive(Debug, Serialize)]
pub struct BackendStatus {
    pub configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    pub reachable: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub backend: BackendStatus,
    pub endpoints: Vec<&'static str>,
}

/// GET / and GET /health
///
/// The service is healthy without a backend; `backend.reachable` only tells
/// callers whether results will come from it or from the local engines.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let backend = match state.analyzer.backend() {
        Some(client) => BackendStatus {
            configured: true,
            host: Some(client.host().to_string()),
            reachable: client.health_check().await,
        },
        None => BackendStatus {
            configured: false,
            host: None,
            reachable: false,
        },
    };

    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        backend,
        endpoints: vec![
            "POST /api/spending-forecast",
            "POST /api/analyze",
            "POST /api/dashboard",
            "POST /api/normalize",
            "GET /api/profiles",
            "GET /api/profiles/:key",
        ],
    })
}
