//! Forecast and insight handlers

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{AppError, AppState};
use mealwise_core::forecast::round2;
use mealwise_core::{
    BudgetState, ForecastOutcome, ForecastRequest, ForecastResult, Granularity, InsightOutcome,
    InsightResult, ProfileLookup, ResultSource, TransactionFilter,
};

/// Request body shared by the analysis endpoints
///
/// Budget state comes from `user_data`, or from a named profile when only
/// `selected_profile` is given.
#[derive(Debug, Default, Deserialize)]
pub struct AnalysisBody {
    #[serde(default, alias = "UserData", alias = "userData")]
    pub user_data: Option<BudgetState>,
    #[serde(default)]
    pub selected_profile: Option<String>,
    #[serde(default, alias = "Transactions")]
    pub transactions: Vec<Value>,
    /// daily, weekly or monthly (default daily)
    #[serde(default)]
    pub mode: Option<String>,
    pub filter_type: Option<String>,
    pub filter_value: Option<String>,
    pub horizon: Option<usize>,
}

impl AnalysisBody {
    fn granularity(&self) -> Result<Granularity, AppError> {
        match self.mode.as_deref() {
            Some(mode) => mode.parse().map_err(AppError::from_core),
            None => Ok(Granularity::Daily),
        }
    }

    fn filter(&self) -> Result<Option<TransactionFilter>, AppError> {
        match (&self.filter_type, &self.filter_value) {
            (Some(t), Some(v)) => TransactionFilter::parse(t, v)
                .map(Some)
                .map_err(AppError::from_core),
            (None, None) => Ok(None),
            _ => Err(AppError::bad_request(
                "filter_type and filter_value must be given together",
            )),
        }
    }

    fn state(&self) -> Option<BudgetState> {
        if let Some(state) = &self.user_data {
            return Some(state.clone());
        }
        self.selected_profile.as_deref().map(|key| ProfileLookup::new(key).resolve())
    }

    fn required_state(&self) -> Result<BudgetState, AppError> {
        self.state()
            .ok_or_else(|| AppError::bad_request("user_data or selected_profile is required"))
    }
}

#[derive(Debug, Serialize)]
pub struct ForecastResponse {
    #[serde(flatten)]
    pub result: ForecastResult,
    pub source: ResultSource,
    /// True when the backend failed and local engines answered instead
    pub estimated: bool,
    pub skipped: usize,
}

impl From<ForecastOutcome> for ForecastResponse {
    fn from(outcome: ForecastOutcome) -> Self {
        Self {
            result: outcome.result.rounded(),
            source: outcome.source,
            estimated: outcome.source.is_fallback(),
            skipped: outcome.skipped.len(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InsightResponse {
    #[serde(flatten)]
    pub result: InsightResult,
    pub source: ResultSource,
    pub estimated: bool,
    pub skipped: usize,
}

impl From<InsightOutcome> for InsightResponse {
    fn from(outcome: InsightOutcome) -> Self {
        let mut result = outcome.result;
        result.headline_amount = round2(result.headline_amount);
        Self {
            result,
            source: outcome.source,
            estimated: outcome.source.is_fallback(),
            skipped: outcome.skipped.len(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub forecast: ForecastResponse,
    pub insights: InsightResponse,
}

/// POST /api/spending-forecast - Project spending forward
pub async fn post_forecast(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AnalysisBody>,
) -> Result<Json<ForecastResponse>, AppError> {
    let request = ForecastRequest {
        granularity: body.granularity()?,
        filter: body.filter()?,
        state: body.state(),
        horizon: body.horizon,
        transactions: body.transactions,
    };

    let outcome = state
        .analyzer
        .forecast(&request)
        .await
        .map_err(AppError::from_core)?;

    Ok(Json(outcome.into()))
}

/// POST /api/analyze - Headline insight for a budget snapshot
pub async fn post_analyze(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AnalysisBody>,
) -> Result<Json<InsightResponse>, AppError> {
    let budget = body.required_state()?;

    let outcome = state
        .analyzer
        .insights(&budget, &body.transactions)
        .await
        .map_err(AppError::from_core)?;

    Ok(Json(outcome.into()))
}

/// POST /api/dashboard - Forecast and insight in one call
pub async fn post_dashboard(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AnalysisBody>,
) -> Result<Json<DashboardResponse>, AppError> {
    let budget = body.required_state()?;
    let granularity = body.granularity()?;
    let filter = body.filter()?;

    let outcome = state
        .analyzer
        .dashboard(&budget, &body.transactions, granularity, filter.as_ref())
        .await
        .map_err(AppError::from_core)?;

    Ok(Json(DashboardResponse {
        forecast: outcome.forecast.into(),
        insights: outcome.insights.into(),
    }))
}
