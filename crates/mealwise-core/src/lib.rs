//! Mealwise Core Library
//!
//! Budgeting core for student meal plans:
//! - Tolerant normalization of raw transaction exports (JSON or CSV)
//! - Time-bucketed spending series (daily, weekly, monthly)
//! - Spending forecasts with prediction intervals and trend
//! - Rule-based budget insights (meal-credit waste, flex overspend, ...)
//! - Derived budget state figures
//! - Optional external analytics backend with local fallback

pub mod aggregate;
pub mod backend;
pub mod config;
pub mod error;
pub mod forecast;
pub mod insights;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod profiles;

/// Test utilities including mock analytics server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use aggregate::SeriesAggregator;
pub use backend::{AnalyticsBackend, BackendClient, HttpBackend, MockBackend, MockBehavior};
pub use config::Config;
pub use error::{Error, Result};
pub use forecast::{
    ForecastEngine, ForecastOptions, ForecastPoint, ForecastResult, ForecastSummary, Trend,
    MAX_HORIZON,
};
pub use insights::{InsightContext, InsightEngine, InsightKind, InsightResult, InsightRule};
pub use models::{AggregatedBucket, BudgetState, FundingSource, Granularity, TransactionRecord};
pub use normalize::{
    extract_raw_input, read_csv_records, NormalizedBatch, RawInput, SkipReason, SkippedRecord,
    TransactionFilter, TransactionNormalizer,
};
pub use pipeline::{
    BudgetAnalyzer, DashboardOutcome, ForecastOutcome, ForecastRequest, InsightOutcome,
    ResultSource,
};
pub use profiles::{all_profiles, find_profile, Profile, ProfileLookup, DEFAULT_PROFILE};
