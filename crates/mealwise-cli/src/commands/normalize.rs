//! Normalize command implementation

use std::path::Path;

use anyhow::Result;
use mealwise_core::{BudgetAnalyzer, NormalizedBatch};

use super::{read_input, truncate};

pub fn run_normalize(analyzer: &BudgetAnalyzer, input: &Path) -> Result<NormalizedBatch> {
    let raw = read_input(input)?;
    Ok(analyzer.normalizer().normalize(&raw.transactions))
}

pub fn cmd_normalize(analyzer: &BudgetAnalyzer, input: &Path, json: bool) -> Result<()> {
    let batch = run_normalize(analyzer, input)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&batch)?);
        return Ok(());
    }

    println!();
    println!(
        "🧾 {} record(s) normalized, {} skipped",
        batch.records.len(),
        batch.skipped.len()
    );
    println!("   ─────────────────────────────────────────────────────────────");

    if !batch.records.is_empty() {
        println!(
            "   {:25} │ {:24} │ {:>9} │ {}",
            "When", "Merchant", "Amount", "Paid with"
        );
        println!("   ──────────────────────────┼──────────────────────────┼───────────┼──────────");
        for record in &batch.records {
            println!(
                "   {:25} │ {:24} │ {:>9.2} │ {}",
                record.timestamp.to_rfc3339(),
                truncate(&record.merchant, 24),
                record.amount,
                record.funding_source
            );
        }
    }

    if !batch.skipped.is_empty() {
        println!();
        println!("   Skipped:");
        for skipped in &batch.skipped {
            println!("   • record {}: {}", skipped.index, skipped.reason);
        }
    }

    Ok(())
}
