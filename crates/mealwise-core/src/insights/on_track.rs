//! On Track Rule - the default when nothing else fires

use super::engine::{InsightContext, InsightRule};
use super::types::{InsightKind, InsightResult};

pub struct OnTrackRule;

impl OnTrackRule {
    pub fn new() -> Self {
        Self
    }

    /// Positive summary of the current state
    pub fn summarize(&self, ctx: &InsightContext<'_>) -> InsightResult {
        let state = ctx.state;
        let position = if state.budget_spent < state.budget_total {
            "under"
        } else {
            "on track with"
        };

        InsightResult::new(
            self.kind(),
            format!("Great job! You're {} budget", position),
            (state.budget_total - state.budget_spent).abs(),
        )
        .pattern(format!(
            "Balanced use of meal credits ({} used, {} left)",
            state.meal_credits_used,
            state.meal_credits_remaining()
        ))
        .pattern(format!(
            "Smart flex dollar management (${:.2} spent)",
            state.flex_spent
        ))
        .pattern(format!(
            "Total spending: ${:.2} of ${:.2} budget",
            state.budget_spent, state.budget_total
        ))
        .pattern(format!(
            "With {} weeks remaining, you're on a good trajectory",
            state.weeks_remaining
        ))
        .recommend(
            "Keep up the good work! Continue using meal credits for main meals and flex for occasional treats"
                .to_string(),
        )
    }
}

impl Default for OnTrackRule {
    fn default() -> Self {
        Self::new()
    }
}

impl InsightRule for OnTrackRule {
    fn kind(&self) -> InsightKind {
        InsightKind::OnTrack
    }

    fn name(&self) -> &'static str {
        "On Track"
    }

    fn evaluate(&self, ctx: &InsightContext<'_>) -> Option<InsightResult> {
        Some(self.summarize(ctx))
    }
}
