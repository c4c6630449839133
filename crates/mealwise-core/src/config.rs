//! Configuration for thresholds, forecasting and the external backend
//!
//! ## Configuration Resolution
//!
//! Config is loaded with a two-layer resolution:
//! 1. An explicit path, or the override in the data dir
//!    (~/.local/share/mealwise/config/mealwise.toml)
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! Environment variables are applied last:
//! - `MEALWISE_BACKEND_URL`: external analytics backend base URL
//! - `MEALWISE_BACKEND_TIMEOUT_SECS`: per-call timeout
//! - `MEALWISE_UTC_OFFSET`: local offset such as `-05:00`

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{FixedOffset, Offset, Utc};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::models::{Granularity, DEFAULT_MEAL_CREDIT_VALUE, DEFAULT_PERIOD_WEEKS};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/mealwise.toml");

/// Meal credit pool settings
#[derive(Debug, Clone, PartialEq)]
pub struct CreditsConfig {
    /// Estimated cash value of one meal credit
    pub meal_credit_value: f64,
    /// Length of the meal-plan period in weeks
    pub period_weeks: u32,
}

impl Default for CreditsConfig {
    fn default() -> Self {
        Self {
            meal_credit_value: DEFAULT_MEAL_CREDIT_VALUE,
            period_weeks: DEFAULT_PERIOD_WEEKS,
        }
    }
}

/// Thresholds for the insight rules
#[derive(Debug, Clone, PartialEq)]
pub struct InsightConfig {
    pub high_credit_threshold: u32,
    pub large_overage_threshold: f64,
    pub recoverable_fraction: f64,
    pub trend_note_threshold_pct: f64,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            high_credit_threshold: 50,
            large_overage_threshold: 500.0,
            recoverable_fraction: 0.7,
            trend_note_threshold_pct: 5.0,
        }
    }
}

/// Forecast engine settings
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastConfig {
    /// Prediction interval coverage in (0, 1)
    pub confidence: f64,
    pub trend_threshold_pct: f64,
    pub degraded_band_fraction: f64,
    pub min_history_daily: usize,
    pub min_history_weekly: usize,
    pub min_history_monthly: usize,
}

impl ForecastConfig {
    /// Minimum history length (buckets) before a trend is fitted
    pub fn min_history(&self, granularity: Granularity) -> usize {
        match granularity {
            Granularity::Daily => self.min_history_daily,
            Granularity::Weekly => self.min_history_weekly,
            Granularity::Monthly => self.min_history_monthly,
        }
    }
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            confidence: 0.80,
            trend_threshold_pct: 5.0,
            degraded_band_fraction: 0.5,
            min_history_daily: 7,
            min_history_weekly: 4,
            min_history_monthly: 3,
        }
    }
}

/// External analytics backend settings
#[derive(Debug, Clone, PartialEq)]
pub struct BackendConfig {
    /// Base URL; `None` keeps everything local
    pub url: Option<String>,
    /// Bound on every backend call
    pub timeout: Duration,
    /// Immediate retries before falling back (0 or 1)
    pub max_retries: u32,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout: Duration::from_secs(10),
            max_retries: 1,
        }
    }
}

/// Complete Mealwise configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub credits: CreditsConfig,
    pub insights: InsightConfig,
    pub forecast: ForecastConfig,
    /// User's local offset for date-only timestamps and bucket boundaries
    pub utc_offset: FixedOffset,
    pub backend: BackendConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            credits: CreditsConfig::default(),
            insights: InsightConfig::default(),
            forecast: ForecastConfig::default(),
            utc_offset: utc(),
            backend: BackendConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration (override first, then default), then apply env
    pub fn load(override_path: Option<&Path>) -> Result<Self> {
        let mut config = load_config(override_path)?;
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML content layered over the defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        let config = parse_config(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("MEALWISE_BACKEND_URL") {
            let url = url.trim();
            self.backend.url = if url.is_empty() {
                None
            } else {
                Some(url.to_string())
            };
        }
        if let Ok(secs) = std::env::var("MEALWISE_BACKEND_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                Error::Config(format!("MEALWISE_BACKEND_TIMEOUT_SECS is not a number: {}", secs))
            })?;
            self.backend.timeout = Duration::from_secs(secs);
        }
        if let Ok(offset) = std::env::var("MEALWISE_UTC_OFFSET") {
            self.utc_offset = parse_utc_offset(&offset)?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        let f = &self.forecast;
        if !(f.confidence > 0.0 && f.confidence < 1.0) {
            return Err(Error::Config(format!(
                "forecast.confidence must be between 0 and 1 (exclusive), got {}",
                f.confidence
            )));
        }
        let non_negative = [
            ("credits.meal_credit_value", self.credits.meal_credit_value),
            (
                "insights.large_overage_threshold",
                self.insights.large_overage_threshold,
            ),
            ("insights.recoverable_fraction", self.insights.recoverable_fraction),
            (
                "insights.trend_note_threshold_pct",
                self.insights.trend_note_threshold_pct,
            ),
            ("forecast.trend_threshold_pct", f.trend_threshold_pct),
            ("forecast.degraded_band_fraction", f.degraded_band_fraction),
        ];
        for (key, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::Config(format!(
                    "{} must be non-negative, got {}",
                    key, value
                )));
            }
        }
        if self.credits.period_weeks == 0 {
            return Err(Error::Config("credits.period_weeks must be at least 1".into()));
        }
        Ok(())
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("mealwise").join("config").join("mealwise.toml"))
}

/// Parse a UTC offset such as `+05:30`, `-0800`, `Z` or `UTC`
pub fn parse_utc_offset(s: &str) -> Result<FixedOffset> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("z") || s.eq_ignore_ascii_case("utc") {
        return Ok(utc());
    }

    let invalid = || Error::Config(format!("Invalid UTC offset: {} (expected e.g. -05:00)", s));

    let (sign, rest) = match s.chars().next() {
        Some('+') => (1, &s[1..]),
        Some('-') => (-1, &s[1..]),
        _ => return Err(invalid()),
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let hours: i32 = digits[..2].parse().map_err(|_| invalid())?;
    let minutes: i32 = digits[2..].parse().map_err(|_| invalid())?;
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

fn utc() -> FixedOffset {
    Utc.fix()
}

/// Load configuration (override first, then default)
fn load_config(override_path: Option<&Path>) -> Result<Config> {
    let path = match override_path {
        Some(path) => Some(path.to_path_buf()),
        None => default_config_path(),
    };

    let content = match path {
        Some(path) if path.exists() => {
            tracing::debug!(path = %path.display(), "Loading config override");
            fs::read_to_string(&path)
                .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?
        }
        _ => DEFAULT_CONFIG.to_string(),
    };

    parse_config(&content)
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    credits: Option<RawCredits>,
    insights: Option<RawInsights>,
    forecast: Option<RawForecast>,
    time: Option<RawTime>,
    backend: Option<RawBackend>,
}

#[derive(Debug, Deserialize)]
struct RawCredits {
    meal_credit_value: Option<f64>,
    period_weeks: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RawInsights {
    high_credit_threshold: Option<u32>,
    large_overage_threshold: Option<f64>,
    recoverable_fraction: Option<f64>,
    trend_note_threshold_pct: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawForecast {
    confidence: Option<f64>,
    trend_threshold_pct: Option<f64>,
    degraded_band_fraction: Option<f64>,
    min_history_daily: Option<usize>,
    min_history_weekly: Option<usize>,
    min_history_monthly: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RawTime {
    utc_offset: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawBackend {
    url: Option<String>,
    timeout_secs: Option<u64>,
    max_retries: Option<u32>,
}

/// Parse config from TOML content
fn parse_config(content: &str) -> Result<Config> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

    let mut config = Config::default();

    if let Some(credits) = raw.credits {
        if let Some(value) = credits.meal_credit_value {
            config.credits.meal_credit_value = value;
        }
        if let Some(weeks) = credits.period_weeks {
            config.credits.period_weeks = weeks;
        }
    }

    if let Some(insights) = raw.insights {
        if let Some(threshold) = insights.high_credit_threshold {
            config.insights.high_credit_threshold = threshold;
        }
        if let Some(threshold) = insights.large_overage_threshold {
            config.insights.large_overage_threshold = threshold;
        }
        if let Some(fraction) = insights.recoverable_fraction {
            config.insights.recoverable_fraction = fraction;
        }
        if let Some(pct) = insights.trend_note_threshold_pct {
            config.insights.trend_note_threshold_pct = pct;
        }
    }

    if let Some(forecast) = raw.forecast {
        if let Some(confidence) = forecast.confidence {
            config.forecast.confidence = confidence;
        }
        if let Some(pct) = forecast.trend_threshold_pct {
            config.forecast.trend_threshold_pct = pct;
        }
        if let Some(fraction) = forecast.degraded_band_fraction {
            config.forecast.degraded_band_fraction = fraction;
        }
        if let Some(n) = forecast.min_history_daily {
            config.forecast.min_history_daily = n;
        }
        if let Some(n) = forecast.min_history_weekly {
            config.forecast.min_history_weekly = n;
        }
        if let Some(n) = forecast.min_history_monthly {
            config.forecast.min_history_monthly = n;
        }
    }

    if let Some(time) = raw.time {
        if let Some(offset) = time.utc_offset {
            config.utc_offset = parse_utc_offset(&offset)?;
        }
    }

    if let Some(backend) = raw.backend {
        config.backend.url = backend.url.filter(|u| !u.trim().is_empty());
        if let Some(secs) = backend.timeout_secs {
            config.backend.timeout = Duration::from_secs(secs);
        }
        if let Some(retries) = backend.max_retries {
            if retries > 1 {
                tracing::warn!(retries, "backend.max_retries above 1 is clamped to 1");
            }
            config.backend.max_retries = retries.min(1);
        }
    }

    Ok(config)
}
