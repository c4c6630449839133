//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Mealwise - Keep a meal plan on budget
#[derive(Parser)]
#[command(name = "mealwise")]
#[command(about = "Spending forecasts and budget insights for student meal plans", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Configuration file (defaults to the user data dir override, then built-in defaults)
    #[arg(long = "config", global = true, value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Forecast future spending from a transaction export
    Forecast {
        /// Transaction file (JSON or CSV)
        #[arg(short, long)]
        input: PathBuf,

        /// Bucket size: daily, weekly, monthly
        #[arg(short, long, default_value = "daily")]
        mode: String,

        /// Budget profile used when the input carries no user data
        #[arg(long)]
        profile: Option<String>,

        /// Filter by: category, location, type
        #[arg(long, requires = "filter_value")]
        filter_type: Option<String>,

        /// Value to match for --filter-type
        #[arg(long, requires = "filter_type")]
        filter_value: Option<String>,

        /// Number of buckets to project, 1 to 366 (defaults to 7 days, 4 weeks or 3 months)
        #[arg(long)]
        horizon: Option<usize>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Diagnose a budget snapshot
    Insights {
        /// Named demo profile (see `mealwise profiles`)
        #[arg(long, conflicts_with = "state")]
        profile: Option<String>,

        /// JSON file holding a budget snapshot
        #[arg(long)]
        state: Option<PathBuf>,

        /// Transaction file (JSON or CSV) for trend and category detail
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show how raw transactions normalize, including skipped records
    Normalize {
        /// Transaction file (JSON or CSV)
        #[arg(short, long)]
        input: PathBuf,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// List demo budget profiles
    Profiles,

    /// Show the effective configuration
    Config,

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
}
