//! Profiles command implementation

use anyhow::Result;
use mealwise_core::{all_profiles, Config, InsightEngine, DEFAULT_PROFILE};

pub fn cmd_profiles(config: &Config) -> Result<()> {
    let engine = InsightEngine::from_config(config);
    let period_weeks = config.credits.period_weeks;

    println!();
    println!("👤 Budget Profiles");
    println!("   ─────────────────────────────────────────────────────────────");

    for profile in all_profiles() {
        let state = &profile.state;
        let marker = if profile.key == DEFAULT_PROFILE {
            " (default)"
        } else {
            ""
        };
        let rule = engine
            .derive_insights(state, &[])
            .rule
            .map(|r| r.as_str())
            .unwrap_or("none");

        println!("   {}{} - {}", profile.key, marker, state.name);
        println!("      {}", profile.description);
        println!(
            "      Budget: ${:.2} of ${:.2} ({:.0}%)  Flex: ${:.2} of ${:.2}  Credits left: {}",
            state.budget_spent,
            state.budget_total,
            state.budget_used_pct(),
            state.flex_spent,
            state.flex_total,
            state.meal_credits_remaining()
        );
        if let Some(pace) = state.weekly_pace(period_weeks) {
            println!("      Pace: ${:.2}/week  Rule: {}", pace, rule);
        } else {
            println!("      Rule: {}", rule);
        }
    }

    Ok(())
}
