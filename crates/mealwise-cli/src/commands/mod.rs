//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Shared utilities (config, input files, budget state resolution)
//! - `forecast` - Spending forecast command
//! - `insights` - Budget diagnosis command
//! - `normalize` - Normalization report command
//! - `profiles` - Demo profile listing
//! - `config` - Effective configuration display
//! - `serve` - Web server command

pub mod config;
pub mod core;
pub mod forecast;
pub mod insights;
pub mod normalize;
pub mod profiles;
pub mod serve;

// Re-export command functions for main.rs
pub use config::*;
pub use self::core::*;
pub use forecast::*;
pub use insights::*;
pub use normalize::*;
pub use profiles::*;
pub use serve::*;

/// Truncate a string to max length with ellipsis
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Label shown next to results that came from the local fallback
pub fn source_note(source: mealwise_core::ResultSource) -> &'static str {
    match source {
        mealwise_core::ResultSource::Local => "local",
        mealwise_core::ResultSource::Backend => "analytics service",
        mealwise_core::ResultSource::LocalFallback => "estimated locally (analytics service unavailable)",
    }
}
