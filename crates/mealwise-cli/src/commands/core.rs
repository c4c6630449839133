//! Shared utilities for command implementations
//!
//! This module contains:
//! - `load_config` - Resolve configuration from --config, the user override or defaults
//! - `build_analyzer` - Construct the analysis pipeline
//! - `read_input` - Load a JSON or CSV transaction file
//! - `resolve_state` - Pick the budget snapshot for a command

use std::fs::{self, File};
use std::path::Path;

use anyhow::{bail, Context, Result};
use mealwise_core::{
    extract_raw_input, read_csv_records, BudgetAnalyzer, BudgetState, Config, ProfileLookup,
    RawInput,
};
use serde_json::Value;

pub fn load_config(path: Option<&Path>) -> Result<Config> {
    Config::load(path).context("Failed to load configuration")
}

pub fn build_analyzer(config: Config) -> Result<BudgetAnalyzer> {
    BudgetAnalyzer::new(config).context("Failed to initialize analyzer")
}

/// Read a transaction file
///
/// `.csv` files are read row by row with the header as field names;
/// anything else is parsed as JSON (a bare array, or an object with a
/// `transactions` array and optional user data).
pub fn read_input(path: &Path) -> Result<RawInput> {
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));

    if is_csv {
        let file =
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        let transactions = read_csv_records(file)
            .with_context(|| format!("Failed to parse CSV {}", path.display()))?;
        return Ok(RawInput {
            user_data: None,
            transactions,
        });
    }

    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let doc: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse JSON {}", path.display()))?;
    extract_raw_input(doc).with_context(|| format!("Unexpected layout in {}", path.display()))
}

/// Budget snapshot for a command
///
/// Priority: --state file > --profile > user data embedded in the input.
/// Returns None when none of them is given.
pub fn resolve_state(
    profile: Option<&str>,
    state_file: Option<&Path>,
    embedded: Option<Value>,
) -> Result<Option<BudgetState>> {
    if let Some(path) = state_file {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let state = serde_json::from_str(&content)
            .with_context(|| format!("Invalid budget snapshot in {}", path.display()))?;
        return Ok(Some(state));
    }

    if let Some(key) = profile {
        if mealwise_core::find_profile(key).is_none() {
            bail!("Unknown profile: {} (see `mealwise profiles`)", key);
        }
        return Ok(Some(ProfileLookup::new(key).resolve()));
    }

    match embedded {
        Some(value) => {
            let state = serde_json::from_value(value).context("Invalid user data in input")?;
            Ok(Some(state))
        }
        None => Ok(None),
    }
}
