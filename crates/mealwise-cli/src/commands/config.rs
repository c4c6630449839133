//! Config command implementation

use std::path::Path;

use anyhow::Result;
use mealwise_core::config::default_config_path;
use mealwise_core::{Config, Granularity};

pub fn cmd_config(config: &Config, explicit: Option<&Path>) -> Result<()> {
    let source = match explicit {
        Some(path) => path.display().to_string(),
        None => match default_config_path() {
            Some(path) if path.exists() => path.display().to_string(),
            _ => "built-in defaults".to_string(),
        },
    };

    println!();
    println!("⚙️  Configuration");
    println!("   Source: {}", source);
    println!("   ─────────────────────────────────────────────────────────────");

    println!("   [credits]");
    println!("   meal_credit_value        = {}", config.credits.meal_credit_value);
    println!("   period_weeks             = {}", config.credits.period_weeks);

    println!("   [insights]");
    println!("   high_credit_threshold    = {}", config.insights.high_credit_threshold);
    println!("   large_overage_threshold  = {}", config.insights.large_overage_threshold);
    println!("   recoverable_fraction     = {}", config.insights.recoverable_fraction);
    println!("   trend_note_threshold_pct = {}", config.insights.trend_note_threshold_pct);

    let f = &config.forecast;
    println!("   [forecast]");
    println!("   confidence               = {}", f.confidence);
    println!("   trend_threshold_pct      = {}", f.trend_threshold_pct);
    println!("   degraded_band_fraction   = {}", f.degraded_band_fraction);
    for granularity in [Granularity::Daily, Granularity::Weekly, Granularity::Monthly] {
        println!(
            "   min_history_{:12}= {}",
            granularity.as_str(),
            f.min_history(granularity)
        );
    }

    println!("   [time]");
    println!("   utc_offset               = {}", config.utc_offset);

    println!("   [backend]");
    println!(
        "   url                      = {}",
        config.backend.url.as_deref().unwrap_or("(local only)")
    );
    println!("   timeout_secs             = {}", config.backend.timeout.as_secs());
    println!("   max_retries              = {}", config.backend.max_retries);

    Ok(())
}
