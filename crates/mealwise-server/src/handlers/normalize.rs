//! Normalization report

use std::sync::Arc;

use axum::{extract::State, Json};
use serde_json::Value;

use crate::{AppError, AppState};
use mealwise_core::{extract_raw_input, NormalizedBatch};

/// POST /api/normalize - Canonical records plus a report of skipped ones
///
/// Accepts a bare array of records or an object with a `transactions` array.
pub async fn post_normalize(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<NormalizedBatch>, AppError> {
    let input = extract_raw_input(body).map_err(AppError::from_core)?;
    let batch = state.analyzer.normalizer().normalize(&input.transactions);

    tracing::info!(
        records = batch.records.len(),
        skipped = batch.skipped.len(),
        "Normalized transactions"
    );

    Ok(Json(batch))
}
