//! Swipe Waste Rule
//!
//! Fires when a large pool of meal credits sits unused. The headline
//! amount is the cash value of the idle credits.

use crate::config::{CreditsConfig, InsightConfig};

use super::engine::{InsightContext, InsightRule};
use super::types::{InsightKind, InsightResult};

pub struct SwipeWasteRule {
    /// Remaining credits must exceed this
    threshold: u32,
    credit_value: f64,
    recoverable_fraction: f64,
    period_weeks: u32,
}

impl SwipeWasteRule {
    pub fn new(credits: &CreditsConfig, thresholds: &InsightConfig) -> Self {
        Self {
            threshold: thresholds.high_credit_threshold,
            credit_value: credits.meal_credit_value,
            recoverable_fraction: thresholds.recoverable_fraction,
            period_weeks: credits.period_weeks,
        }
    }

    /// Where spend ends up if the current weekly pace holds
    fn pace_pattern(&self, ctx: &InsightContext<'_>) -> String {
        let state = ctx.state;
        match state.projected_total_spend(self.period_weeks) {
            Some(projected) if projected > state.budget_total => format!(
                "At this rate, you'll be ${:.0} over budget by the end of the period",
                projected - state.budget_total
            ),
            Some(projected) => format!(
                "At this rate, you'll finish ${:.0} under budget",
                state.budget_total - projected
            ),
            None => {
                let overage = state.budget_overage();
                format!(
                    "You're currently ${:.0} {} budget",
                    overage.abs(),
                    if overage > 0.0 { "over" } else { "under" }
                )
            }
        }
    }
}

impl InsightRule for SwipeWasteRule {
    fn kind(&self) -> InsightKind {
        InsightKind::SwipeWaste
    }

    fn name(&self) -> &'static str {
        "Swipe Waste"
    }

    fn evaluate(&self, ctx: &InsightContext<'_>) -> Option<InsightResult> {
        let state = ctx.state;
        let remaining = state.meal_credits_remaining();
        if remaining <= self.threshold {
            return None;
        }

        let wasted = remaining as f64 * self.credit_value;

        let result = InsightResult::new(
            self.kind(),
            format!(
                "You're wasting ${:.0} by letting {} meal credits expire unused",
                wasted, remaining
            ),
            wasted,
        )
        .pattern(format!(
            "Buying food off-campus while {} meal credits remain unused",
            remaining
        ))
        .pattern(format!(
            "Each unused meal credit is worth ${:.2}, that's ${:.2} going to waste",
            self.credit_value, wasted
        ))
        .pattern(format!(
            "You've spent ${:.2} ({:.0}% of budget)",
            state.budget_spent,
            state.budget_used_pct()
        ))
        .pattern(self.pace_pattern(ctx))
        .recommend(format!(
            "Start using meal credits for breakfast and lunch - you could save ${:.0} by using them instead of buying off-campus",
            wasted * self.recoverable_fraction
        ));

        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BudgetState;

    fn quinn() -> BudgetState {
        BudgetState {
            name: "Quinn".to_string(),
            budget_total: 3175.0,
            budget_spent: 4288.62,
            meal_credits_total: 161,
            meal_credits_used: 105,
            flex_total: 800.0,
            flex_spent: 680.0,
            weeks_remaining: 8,
            preferences: None,
        }
    }

    fn rule() -> SwipeWasteRule {
        SwipeWasteRule::new(&CreditsConfig::default(), &InsightConfig::default())
    }

    #[test]
    fn test_figures_come_from_state() {
        let s = quinn();
        let result = rule().evaluate(&InsightContext::new(&s, &[])).unwrap();

        assert_eq!(result.headline_amount, 672.0);
        assert_eq!(
            result.patterns,
            vec![
                "Buying food off-campus while 56 meal credits remain unused".to_string(),
                "Each unused meal credit is worth $12.00, that's $672.00 going to waste".to_string(),
                "You've spent $4288.62 (135% of budget)".to_string(),
                "At this rate, you'll be $5402 over budget by the end of the period".to_string(),
            ]
        );
        assert!(result.recommendation.contains("$470"));
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let mut s = quinn();
        s.meal_credits_used = 111; // exactly 50 left
        assert!(rule().evaluate(&InsightContext::new(&s, &[])).is_none());
    }

    #[test]
    fn test_configured_credit_value() {
        let credits = CreditsConfig {
            meal_credit_value: 10.0,
            ..CreditsConfig::default()
        };
        let s = quinn();
        let result = SwipeWasteRule::new(&credits, &InsightConfig::default())
            .evaluate(&InsightContext::new(&s, &[]))
            .unwrap();
        assert_eq!(result.headline_amount, 560.0);
    }

    #[test]
    fn test_no_elapsed_weeks_reports_current_position() {
        let mut s = quinn();
        s.weeks_remaining = 16;
        s.budget_spent = 0.0;
        let result = rule().evaluate(&InsightContext::new(&s, &[])).unwrap();
        assert_eq!(result.patterns[3], "You're currently $3175 under budget");
    }
}
