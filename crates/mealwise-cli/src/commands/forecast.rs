//! Forecast command implementation

use std::path::Path;

use anyhow::{Context, Result};
use mealwise_core::{
    BudgetAnalyzer, ForecastOutcome, ForecastRequest, Granularity, TransactionFilter,
};

use super::{read_input, resolve_state, source_note};

/// Build and run a forecast request from CLI arguments
pub async fn run_forecast(
    analyzer: &BudgetAnalyzer,
    input: &Path,
    mode: &str,
    profile: Option<&str>,
    filter: Option<(&str, &str)>,
    horizon: Option<usize>,
) -> Result<ForecastOutcome> {
    let granularity: Granularity = mode.parse()?;
    let filter = filter
        .map(|(t, v)| TransactionFilter::parse(t, v))
        .transpose()?;

    let raw = read_input(input)?;
    let state = resolve_state(profile, None, raw.user_data)?;

    let request = ForecastRequest {
        transactions: raw.transactions,
        state,
        granularity,
        horizon,
        filter,
    };
    analyzer
        .forecast(&request)
        .await
        .context("Forecast failed")
}

pub async fn cmd_forecast(
    analyzer: &BudgetAnalyzer,
    input: &Path,
    mode: &str,
    profile: Option<&str>,
    filter: Option<(&str, &str)>,
    horizon: Option<usize>,
    json: bool,
) -> Result<()> {
    let outcome = run_forecast(analyzer, input, mode, profile, filter, horizon).await?;
    let result = outcome.result.rounded();

    if json {
        let body = serde_json::json!({
            "forecast": result.points,
            "summary": result.summary,
            "metadata": result.metadata,
            "source": outcome.source,
            "skipped": outcome.skipped,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    let summary = &result.summary;
    println!();
    println!("📈 Spending Forecast ({})", summary.granularity.as_str());
    if let Some(filter) = &result.metadata.filter {
        println!("   Filter: {}", filter);
    }
    if let Some(range) = &result.metadata.historical_date_range {
        println!(
            "   History: {} {}s ({} to {})",
            result.metadata.historical_data_points,
            summary.granularity.noun(),
            range.start,
            range.end
        );
    }
    println!("   Source: {}", source_note(outcome.source));
    if let Some(reason) = &summary.degraded {
        println!("   ⚠️  Flat projection: {}", reason);
    }
    if !outcome.skipped.is_empty() {
        println!(
            "   ⚠️  Skipped {} malformed record(s) (see `mealwise normalize`)",
            outcome.skipped.len()
        );
    }
    println!("   ─────────────────────────────────────────────────────────────");

    println!(
        "   {:12} │ {:>10} │ {:>10} │ {:>10}",
        "Start", "Predicted", "Low", "High"
    );
    println!("   ─────────────┼────────────┼────────────┼────────────");
    for point in &result.points {
        println!(
            "   {:12} │ {:>10.2} │ {:>10.2} │ {:>10.2}",
            point.date.to_string(),
            point.predicted_amount,
            point.lower_bound,
            point.upper_bound
        );
    }
    println!("   ─────────────┼────────────┼────────────┼────────────");
    println!("   {:12} │ {:>10.2} │", "Total", summary.total_forecasted);
    println!();
    println!("   Per day:        ${:.2}", summary.mean_daily_expenditure);
    println!(
        "   Historical avg: ${:.2} per {}",
        summary.historical_mean,
        summary.granularity.noun()
    );
    match summary.percent_change_vs_historical {
        Some(pct) => println!("   Trend:          {} ({:+.1}%)", summary.trend, pct),
        None => println!("   Trend:          {}", summary.trend),
    }
    println!("   Interval:       {}", summary.confidence_description);

    Ok(())
}
