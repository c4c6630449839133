//! Over Budget Rule
//!
//! Fires when total spend exceeds the budget by more than the large-overage
//! threshold. Its recommendation is the most urgent of all rules.

use crate::config::{CreditsConfig, InsightConfig};

use super::engine::{InsightContext, InsightRule};
use super::types::{InsightKind, InsightResult};

pub struct OverBudgetRule {
    /// Overage must exceed this
    threshold: f64,
    credit_value: f64,
}

impl OverBudgetRule {
    pub fn new(credits: &CreditsConfig, thresholds: &InsightConfig) -> Self {
        Self {
            threshold: thresholds.large_overage_threshold,
            credit_value: credits.meal_credit_value,
        }
    }
}

impl InsightRule for OverBudgetRule {
    fn kind(&self) -> InsightKind {
        InsightKind::OverBudget
    }

    fn name(&self) -> &'static str {
        "Over Budget"
    }

    fn evaluate(&self, ctx: &InsightContext<'_>) -> Option<InsightResult> {
        let state = ctx.state;
        let overage = state.budget_overage();
        if overage <= self.threshold {
            return None;
        }

        let remaining = state.meal_credits_remaining();

        let off_campus = match ctx.external_share_pct() {
            Some(pct) => format!(
                "Off-campus purchases make up {:.0}% of tracked spending",
                pct
            ),
            None => "High off-campus dining expenses".to_string(),
        };

        let recommendation = if remaining > 0 {
            format!(
                "Urgent: Use all {} remaining meal credits and avoid off-campus purchases to get back on track",
                remaining
            )
        } else {
            format!(
                "Urgent: Avoid off-campus purchases for the remaining {} weeks to get back on track",
                state.weeks_remaining
            )
        };

        Some(
            InsightResult::new(
                self.kind(),
                format!("You're significantly over budget by ${:.0}", overage),
                overage,
            )
            .pattern(format!(
                "Total spending: ${:.2} vs budget: ${:.2}",
                state.budget_spent, state.budget_total
            ))
            .pattern(format!(
                "{} unused meal credits worth ${:.2}",
                remaining,
                remaining as f64 * self.credit_value
            ))
            .pattern(off_campus)
            .pattern(format!(
                "With {} weeks left, this trend needs to change",
                state.weeks_remaining
            ))
            .recommend(recommendation),
        )
    }
}
