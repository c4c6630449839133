//! Spending forecasts
//!
//! Projects aggregated spend forward with prediction intervals, a trend
//! classification and summary statistics.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mealwise_core::forecast::{ForecastEngine, ForecastOptions};
//!
//! let engine = ForecastEngine::new(config.forecast.clone());
//! let result = engine.forecast(&history, &ForecastOptions::new(Granularity::Weekly))?;
//! println!("{}", result.summary.trend);
//! ```

pub mod engine;
pub mod types;

pub use engine::{ForecastEngine, ForecastOptions, MAX_HORIZON};
pub use types::{
    round2, DateRange, DegradedReason, ForecastMetadata, ForecastPoint, ForecastResult,
    ForecastSummary, Trend,
};
