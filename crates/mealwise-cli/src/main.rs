//! Mealwise CLI - Meal-plan budget forecasts and insights
//!
//! Usage:
//!   mealwise forecast --input tx.json --mode weekly   Forecast spending
//!   mealwise insights --profile flex_abuser           Diagnose a budget
//!   mealwise normalize --input export.csv             Inspect normalization
//!   mealwise serve --port 3000                        Start web server

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let config = commands::load_config(cli.config_file.as_deref())?;

    match cli.command {
        Commands::Forecast {
            input,
            mode,
            profile,
            filter_type,
            filter_value,
            horizon,
            json,
        } => {
            let analyzer = commands::build_analyzer(config)?;
            let filter = filter_type.as_deref().zip(filter_value.as_deref());
            commands::cmd_forecast(
                &analyzer,
                &input,
                &mode,
                profile.as_deref(),
                filter,
                horizon,
                json,
            )
            .await
        }
        Commands::Insights {
            profile,
            state,
            input,
            json,
        } => {
            let analyzer = commands::build_analyzer(config)?;
            commands::cmd_insights(
                &analyzer,
                profile.as_deref(),
                state.as_deref(),
                input.as_deref(),
                json,
            )
            .await
        }
        Commands::Normalize { input, json } => {
            let analyzer = commands::build_analyzer(config)?;
            commands::cmd_normalize(&analyzer, &input, json)
        }
        Commands::Profiles => commands::cmd_profiles(&config),
        Commands::Config => commands::cmd_config(&config, cli.config_file.as_deref()),
        Commands::Serve { port, host } => commands::cmd_serve(config, &host, port).await,
    }
}
