//! Error types for Mealwise

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Upstream unavailable: {0}")]
    Upstream(String),

    #[error("Upstream timed out after {0:?}")]
    Timeout(Duration),
}

impl Error {
    /// Whether this error came from the external backend boundary
    ///
    /// Upstream errors are always recoverable by local computation.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Error::Http(_) | Error::Upstream(_) | Error::Timeout(_) | Error::Json(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
