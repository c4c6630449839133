//! Core types for the Insight Engine

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Diagnostic rules, in evaluation priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    /// Many meal credits left idle
    SwipeWaste,
    /// Flex balance overdrawn
    FlexOverspend,
    /// Overall budget exceeded by a large margin
    OverBudget,
    /// Nothing alarming
    OnTrack,
}

impl InsightKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsightKind::SwipeWaste => "swipe_waste",
            InsightKind::FlexOverspend => "flex_overspend",
            InsightKind::OverBudget => "over_budget",
            InsightKind::OnTrack => "on_track",
        }
    }
}

impl fmt::Display for InsightKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for InsightKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "swipe_waste" => Ok(InsightKind::SwipeWaste),
            "flex_overspend" => Ok(InsightKind::FlexOverspend),
            "over_budget" => Ok(InsightKind::OverBudget),
            "on_track" => Ok(InsightKind::OnTrack),
            _ => Err(format!("Unknown insight kind: {}", s)),
        }
    }
}

/// Headline diagnosis with supporting patterns and one recommendation
///
/// Accepts the analytics service's `main_insight`/`dollar_amount` names
/// when deserializing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightResult {
    #[serde(alias = "main_insight")]
    pub headline: String,
    #[serde(alias = "dollar_amount")]
    pub headline_amount: f64,
    /// Most severe first
    #[serde(default)]
    pub patterns: Vec<String>,
    pub recommendation: String,
    /// Rule that produced this result; absent for backend results
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<InsightKind>,
}

impl InsightResult {
    pub fn new(kind: InsightKind, headline: String, headline_amount: f64) -> Self {
        Self {
            headline,
            headline_amount,
            patterns: Vec::new(),
            recommendation: String::new(),
            rule: Some(kind),
        }
    }

    pub fn pattern(mut self, pattern: String) -> Self {
        self.patterns.push(pattern);
        self
    }

    pub fn recommend(mut self, recommendation: String) -> Self {
        self.recommendation = recommendation;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trip() {
        for kind in [
            InsightKind::SwipeWaste,
            InsightKind::FlexOverspend,
            InsightKind::OverBudget,
            InsightKind::OnTrack,
        ] {
            assert_eq!(kind.as_str().parse::<InsightKind>().unwrap(), kind);
        }
        assert!("mystery".parse::<InsightKind>().is_err());
    }

    #[test]
    fn test_accepts_service_field_names() {
        let json = serde_json::json!({
            "main_insight": "You're wasting $672",
            "dollar_amount": 672,
            "patterns": ["a", "b"],
            "recommendation": "Use your swipes"
        });
        let result: InsightResult = serde_json::from_value(json).unwrap();
        assert_eq!(result.headline_amount, 672.0);
        assert_eq!(result.patterns.len(), 2);
        assert!(result.rule.is_none());
    }
}
