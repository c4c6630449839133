//! Mealwise Web Server
//!
//! Axum-based REST API over the Mealwise budgeting core.
//!
//! - Spending forecasts and budget insights, backend-first with local fallback
//! - Transaction normalization reports
//! - Demo budget profiles
//! - Sanitized JSON error responses

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use mealwise_core::{AnalyticsBackend, BudgetAnalyzer};

mod handlers;

/// Server configuration
#[derive(Clone, Default)]
pub struct ServerConfig {
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
}

/// Shared application state
pub struct AppState {
    pub analyzer: BudgetAnalyzer,
    pub config: ServerConfig,
}

pub fn create_router(analyzer: BudgetAnalyzer, config: ServerConfig) -> Router {
    match analyzer.backend() {
        Some(backend) => info!("Analytics backend configured: {}", backend.host()),
        None => info!("Analytics backend not configured, computing locally"),
    }

    let state = Arc::new(AppState {
        analyzer,
        config: config.clone(),
    });

    let api_routes = Router::new()
        .route("/spending-forecast", post(handlers::post_forecast))
        .route("/analyze", post(handlers::post_analyze))
        .route("/dashboard", post(handlers::post_dashboard))
        .route("/normalize", post(handlers::post_normalize))
        .route("/profiles", get(handlers::list_profiles))
        .route("/profiles/:key", get(handlers::get_profile));

    let cors = if config.allowed_origins.is_empty() {
        CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
    };

    Router::new()
        .route("/", get(handlers::health))
        .route("/health", get(handlers::health))
        .nest("/api", api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Start the server
pub async fn serve(
    analyzer: BudgetAnalyzer,
    host: &str,
    port: u16,
    config: ServerConfig,
) -> anyhow::Result<()> {
    check_backend_connection(&analyzer).await;

    let app = create_router(analyzer, config);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn check_backend_connection(analyzer: &BudgetAnalyzer) {
    if let Some(backend) = analyzer.backend() {
        if backend.health_check().await {
            info!("Analytics backend connected: {}", backend.host());
        } else {
            warn!(
                "Analytics backend configured but not responding: {} (local fallback active)",
                backend.host()
            );
        }
    }
}

// ============================================================================
// Error Handling
// ============================================================================

pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn internal(msg: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.to_string(),
            internal: None,
        }
    }

    /// Map a core error: caller mistakes are 400s, everything else is internal
    pub fn from_core(err: mealwise_core::Error) -> Self {
        use mealwise_core::Error;
        match err {
            Error::InvalidInput(_) | Error::Csv(_) => {
                Self::bad_request(&err.to_string())
            }
            other => other.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            // Return generic message to client
            message: "An internal error occurred".to_string(),
            internal: Some(err),
        }
    }
}

#[cfg(test)]
mod tests;
