//! Insights command implementation

use std::path::Path;

use anyhow::{Context, Result};
use mealwise_core::{BudgetAnalyzer, InsightOutcome, ProfileLookup};

use super::{read_input, resolve_state, source_note};

/// Resolve the snapshot and transactions, then derive insights
///
/// Without --state, --profile or embedded user data the default profile
/// is used.
pub async fn run_insights(
    analyzer: &BudgetAnalyzer,
    profile: Option<&str>,
    state_file: Option<&Path>,
    input: Option<&Path>,
) -> Result<InsightOutcome> {
    let raw = input.map(read_input).transpose()?;
    let (embedded, transactions) = match raw {
        Some(raw) => (raw.user_data, raw.transactions),
        None => (None, Vec::new()),
    };

    let state = match resolve_state(profile, state_file, embedded)? {
        Some(state) => state,
        None => ProfileLookup::default().resolve(),
    };

    analyzer
        .insights(&state, &transactions)
        .await
        .context("Insight analysis failed")
}

pub async fn cmd_insights(
    analyzer: &BudgetAnalyzer,
    profile: Option<&str>,
    state_file: Option<&Path>,
    input: Option<&Path>,
    json: bool,
) -> Result<()> {
    let outcome = run_insights(analyzer, profile, state_file, input).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    let result = &outcome.result;
    println!();
    match result.rule {
        Some(rule) => println!("💡 {} ({})", result.headline, rule),
        None => println!("💡 {}", result.headline),
    }
    println!("   Amount: ${:.2}", result.headline_amount);
    println!("   Source: {}", source_note(outcome.source));
    println!("   ─────────────────────────────────────────────────────────────");

    if !result.patterns.is_empty() {
        println!("   Patterns:");
        for pattern in &result.patterns {
            println!("   • {}", pattern);
        }
        println!();
    }
    println!("   👉 {}", result.recommendation);

    if !outcome.skipped.is_empty() {
        println!();
        println!(
            "   ⚠️  Skipped {} malformed record(s) (see `mealwise normalize`)",
            outcome.skipped.len()
        );
    }

    Ok(())
}
