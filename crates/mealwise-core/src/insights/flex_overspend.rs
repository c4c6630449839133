//! Flex Overspend Rule

use crate::config::CreditsConfig;

use super::engine::{InsightContext, InsightRule};
use super::types::{InsightKind, InsightResult};

/// Fires when flex spending has run past the flex balance
pub struct FlexOverspendRule {
    credit_value: f64,
}

impl FlexOverspendRule {
    pub fn new(credits: &CreditsConfig) -> Self {
        Self {
            credit_value: credits.meal_credit_value,
        }
    }
}

impl InsightRule for FlexOverspendRule {
    fn kind(&self) -> InsightKind {
        InsightKind::FlexOverspend
    }

    fn name(&self) -> &'static str {
        "Flex Overspend"
    }

    fn evaluate(&self, ctx: &InsightContext<'_>) -> Option<InsightResult> {
        let state = ctx.state;
        if state.flex_spent <= state.flex_total {
            return None;
        }

        let overspend = state.flex_spent - state.flex_total;

        let utilization = if state.flex_total > 0.0 {
            format!(
                "Flex spending is at ${:.2} ({:.0}% of flex balance)",
                state.flex_spent,
                state.flex_used_pct()
            )
        } else {
            format!(
                "Flex spending is at ${:.2} with no flex balance allotted",
                state.flex_spent
            )
        };

        let contributor = match ctx.top_flex_contributor() {
            Some((name, total)) => format!(
                "Most flex spending went to {} (${:.2})",
                name, total
            ),
            None => "Frequent purchases at campus cafes adding up quickly".to_string(),
        };

        let remaining = state.meal_credits_remaining();
        let recommendation = if remaining > 0 {
            format!(
                "Switch to meal credits for regular meals ({} left, worth ${:.0}) - save flex dollars for snacks and coffee only",
                remaining,
                remaining as f64 * self.credit_value
            )
        } else {
            "Plan regular meals around the dining halls and save flex dollars for snacks and coffee only"
                .to_string()
        };

        Some(
            InsightResult::new(
                self.kind(),
                format!("You've overspent your flex dollars by ${:.0}", overspend),
                overspend,
            )
            .pattern(utilization)
            .pattern(contributor)
            .pattern(format!(
                "You've spent ${:.2} total ({:.0}% of budget)",
                state.budget_spent,
                state.budget_used_pct()
            ))
            .recommend(recommendation),
        )
    }
}
