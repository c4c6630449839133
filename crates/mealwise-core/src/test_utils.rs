//! Test utilities for mealwise-core
//!
//! A mock analytics service speaking the same JSON as the real one, for
//! exercising `HttpBackend` and the pipeline's fallback paths end to end.

use axum::{
    extract::Json,
    http::StatusCode,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::SocketAddr;
use tokio::sync::oneshot;

use crate::models::{AggregatedBucket, Granularity};

/// Mock analytics server for testing and development
pub struct MockAnalyticsServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockAnalyticsServer {
    /// Start a well-behaved mock server on an available port
    pub async fn start() -> Self {
        let app = Router::new()
            .route("/health", get(handle_health))
            .route("/api/spending-forecast", post(handle_forecast))
            .route("/api/analyze", post(handle_analyze));
        Self::spawn(app).await
    }

    /// Start a server that answers every request with HTTP 503
    pub async fn start_failing() -> Self {
        let app = Router::new().fallback(|| async {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"error": "model not loaded"})),
            )
        });
        Self::spawn(app).await
    }

    async fn spawn(app: Router) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockAnalyticsServer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[derive(Deserialize)]
struct ForecastBody {
    transactions: Vec<AggregatedBucket>,
    mode: Granularity,
}

#[derive(Deserialize)]
struct AnalyzeBody {
    user_data: Value,
    #[serde(default)]
    transactions: Vec<Value>,
}

async fn handle_health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

/// Flat projection of the mean bucket, in the service's camelCase style
async fn handle_forecast(
    Json(body): Json<ForecastBody>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let last = body.transactions.last().ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "no transactions"})),
        )
    })?;
    let mean = body.transactions.iter().map(|b| b.total_amount).sum::<f64>()
        / body.transactions.len() as f64;

    let mut points = Vec::new();
    let mut date = last.start;
    for _ in 0..body.mode.default_horizon() {
        date = match body.mode.next_start(date) {
            Some(next) => next,
            None => break,
        };
        points.push(json!({
            "date": format!("{}T00:00:00", date),
            "predictedAmount": mean,
            "lowerBound": mean * 0.8,
            "upperBound": mean * 1.2,
        }));
    }

    Ok(Json(json!({
        "forecast": points,
        "summary": {"model": "mock"},
    })))
}

/// Answers with the service's legacy field names
async fn handle_analyze(Json(body): Json<AnalyzeBody>) -> Json<Value> {
    let name = body.user_data["name"].as_str().unwrap_or("student");
    let spent = body.user_data["budget_spent"].as_f64().unwrap_or(0.0);
    Json(json!({
        "main_insight": format!("{}, here is your spending review", name),
        "dollar_amount": spent,
        "patterns": [format!("{} transactions analyzed", body.transactions.len()), ""],
        "recommendation": "Plan your meals a week ahead",
    }))
}
