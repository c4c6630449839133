//! Insight Engine - Budget Diagnosis
//!
//! Derives one headline diagnosis, a list of supporting patterns and a
//! single recommendation from a budget snapshot. Rules are evaluated in a
//! strict priority order and the first one that applies wins:
//!
//! - **Swipe Waste** - many meal credits left idle
//! - **Flex Overspend** - flex balance overdrawn
//! - **Over Budget** - total spend far past the budget
//! - **On Track** - everything else
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mealwise_core::insights::InsightEngine;
//!
//! let engine = InsightEngine::from_config(&config);
//! let result = engine.derive_insights(&state, &history);
//! println!("{}", result.headline);
//! ```

pub mod engine;
pub mod flex_overspend;
pub mod on_track;
pub mod over_budget;
pub mod swipe_waste;
pub mod types;

pub use engine::{InsightContext, InsightEngine, InsightRule};
pub use flex_overspend::FlexOverspendRule;
pub use on_track::OnTrackRule;
pub use over_budget::OverBudgetRule;
pub use swipe_waste::SwipeWasteRule;
pub use types::{InsightKind, InsightResult};
