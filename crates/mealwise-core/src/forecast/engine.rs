//! Forecast engine
//!
//! Fits a damped-trend exponential smoothing model (additive errors) to the
//! bucket totals and projects it forward. Parameters come from a fixed grid
//! search minimizing one-step squared error, so identical history always
//! yields identical output. Daily series spanning two or more full weeks
//! get additive day-of-week offsets.
//!
//! Prediction intervals use the analytic variance of the damped-trend
//! model scaled by the normal quantile of the configured coverage.
//! Histories shorter than the configured minimum fall back to a flat
//! projection of the historical mean with a fixed-width band.

use chrono::{Datelike, NaiveDate, Utc};

use crate::aggregate::mean_total;
use crate::config::ForecastConfig;
use crate::error::{Error, Result};
use crate::models::{AggregatedBucket, Granularity};

use super::types::{
    DegradedReason, ForecastMetadata, ForecastPoint, ForecastResult, ForecastSummary, Trend,
};

/// Trend damping factor
const PHI: f64 = 0.9;

/// Weekly cycle length for daily seasonality
const WEEK: usize = 7;

/// Largest accepted horizon, in buckets (a year of days)
pub const MAX_HORIZON: usize = 366;

/// Per-call forecast options
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastOptions {
    pub granularity: Granularity,
    /// Number of buckets to project
    pub horizon: usize,
    /// First projected bucket when history is empty
    pub anchor: Option<NaiveDate>,
    /// Per-bucket baseline used when history is empty
    pub fallback_mean: Option<f64>,
}

impl ForecastOptions {
    /// Options with the granularity's default horizon
    pub fn new(granularity: Granularity) -> Self {
        Self {
            granularity,
            horizon: granularity.default_horizon(),
            anchor: None,
            fallback_mean: None,
        }
    }

    pub fn with_horizon(mut self, horizon: usize) -> Self {
        self.horizon = horizon;
        self
    }

    pub fn with_anchor(mut self, anchor: NaiveDate) -> Self {
        self.anchor = Some(anchor);
        self
    }

    pub fn with_fallback_mean(mut self, mean: f64) -> Self {
        self.fallback_mean = Some(mean);
        self
    }
}

/// Fitted smoothing state
#[derive(Debug, Clone, Copy)]
struct HoltFit {
    alpha: f64,
    beta: f64,
    level: f64,
    trend: f64,
    /// Root mean squared one-step error
    sigma: f64,
}

impl HoltFit {
    /// (point forecast, interval half-width before scaling by z) for
    /// steps 1..=horizon
    ///
    /// The damped sum phi + ... + phi^h and the error variance are carried
    /// across steps, so the whole path costs O(horizon).
    fn path(&self, horizon: usize) -> Vec<(f64, f64)> {
        let mut steps = Vec::with_capacity(horizon);
        let mut power = 1.0;
        let mut damped = 0.0;
        let mut variance = 1.0;

        for h in 1..=horizon {
            if h > 1 {
                // Variance at h adds the term for j = h - 1, using the
                // damped sum through h - 1
                let c = self.alpha * (1.0 + self.beta * damped);
                variance += c * c;
            }
            power *= PHI;
            damped += power;
            steps.push((self.level + damped * self.trend, self.sigma * variance.sqrt()));
        }
        steps
    }
}

/// Run the error-correction recursions; returns (level, trend, sse, steps)
fn smooth(series: &[f64], alpha: f64, beta: f64) -> (f64, f64, f64, usize) {
    let mut level = series[0];
    let mut trend = initial_trend(series);
    let mut sse = 0.0;
    let mut steps = 0;

    for &y in &series[1..] {
        let error = y - (level + PHI * trend);
        level = level + PHI * trend + alpha * error;
        trend = PHI * trend + alpha * beta * error;
        sse += error * error;
        steps += 1;
    }

    (level, trend, sse, steps)
}

/// Mean slope over the first few steps
fn initial_trend(series: &[f64]) -> f64 {
    let span = (series.len() - 1).min(3);
    if span == 0 {
        return 0.0;
    }
    (series[span] - series[0]) / span as f64
}

/// Grid-search the smoothing parameters; first minimum wins ties
fn fit(series: &[f64]) -> HoltFit {
    let mut best: Option<(f64, HoltFit)> = None;

    for a in 1..=9 {
        let alpha = a as f64 / 10.0;
        for b in 0..=5 {
            let beta = b as f64 / 10.0;
            let (level, trend, sse, steps) = smooth(series, alpha, beta);
            if best.as_ref().is_some_and(|(best_sse, _)| sse >= *best_sse) {
                continue;
            }
            let sigma = if steps > 0 {
                (sse / steps as f64).sqrt()
            } else {
                0.0
            };
            best = Some((
                sse,
                HoltFit {
                    alpha,
                    beta,
                    level,
                    trend,
                    sigma,
                },
            ));
        }
    }

    // The grid is never empty
    best.map(|(_, fit)| fit).unwrap_or(HoltFit {
        alpha: 0.5,
        beta: 0.0,
        level: series[0],
        trend: 0.0,
        sigma: 0.0,
    })
}

/// Additive day-of-week offsets indexed by `num_days_from_monday`
fn weekday_offsets(history: &[AggregatedBucket]) -> [f64; WEEK] {
    let overall = mean_total(history).unwrap_or(0.0);
    let mut sums = [0.0; WEEK];
    let mut counts = [0usize; WEEK];
    for bucket in history {
        let day = bucket.start.weekday().num_days_from_monday() as usize;
        sums[day] += bucket.total_amount;
        counts[day] += 1;
    }

    let mut offsets = [0.0; WEEK];
    for day in 0..WEEK {
        if counts[day] > 0 {
            offsets[day] = sums[day] / counts[day] as f64 - overall;
        }
    }
    let centre = offsets.iter().sum::<f64>() / WEEK as f64;
    for offset in &mut offsets {
        *offset -= centre;
    }
    offsets
}

fn offset_for(offsets: &Option<[f64; WEEK]>, date: NaiveDate) -> f64 {
    offsets
        .as_ref()
        .map(|o| o[date.weekday().num_days_from_monday() as usize])
        .unwrap_or(0.0)
}

/// Standard normal quantile (Acklam's rational approximation)
pub(crate) fn inverse_normal_cdf(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969683028665376e+01,
        2.209460984245205e+02,
        -2.759285104469687e+02,
        1.383577518672690e+02,
        -3.066479806614716e+01,
        2.506628277459239e+00,
    ];
    const B: [f64; 5] = [
        -5.447609879822406e+01,
        1.615858368580409e+02,
        -1.556989798598866e+02,
        6.680131188771972e+01,
        -1.328068155288572e+01,
    ];
    const C: [f64; 6] = [
        -7.784894002430293e-03,
        -3.223964580411365e-01,
        -2.400758277161838e+00,
        -2.549732539343734e+00,
        4.374664141464968e+00,
        2.938163982698783e+00,
    ];
    const D: [f64; 4] = [
        7.784695709041462e-03,
        3.224671290700398e-01,
        2.445134137142996e+00,
        3.754408661907416e+00,
    ];
    const P_LOW: f64 = 0.02425;

    let tail = |q: f64| {
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    };

    if p < P_LOW {
        tail((-2.0 * p.ln()).sqrt())
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        -tail((-2.0 * (1.0 - p).ln()).sqrt())
    }
}

/// Projects aggregated spend forward with prediction intervals
#[derive(Debug, Clone, Default)]
pub struct ForecastEngine {
    config: ForecastConfig,
}

impl ForecastEngine {
    pub fn new(config: ForecastConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Human description of the interval coverage
    pub fn coverage_description(&self) -> String {
        format!("{:.0}% prediction interval", self.config.confidence * 100.0)
    }

    /// Forecast `options.horizon` buckets following `history`
    ///
    /// Never fails for short or empty history; those produce a degraded
    /// flat projection flagged in the summary. Only invalid options are
    /// rejected.
    pub fn forecast(
        &self,
        history: &[AggregatedBucket],
        options: &ForecastOptions,
    ) -> Result<ForecastResult> {
        if options.horizon == 0 {
            return Err(Error::InvalidInput(
                "forecast horizon must be at least 1".to_string(),
            ));
        }
        if options.horizon > MAX_HORIZON {
            return Err(Error::InvalidInput(format!(
                "forecast horizon must be at most {} buckets, got {}",
                MAX_HORIZON, options.horizon
            )));
        }
        if let Some(mean) = options.fallback_mean {
            if !mean.is_finite() || mean < 0.0 {
                return Err(Error::InvalidInput(format!(
                    "fallback mean must be a non-negative amount, got {}",
                    mean
                )));
            }
        }

        let granularity = options.granularity;
        let dates = self.projection_dates(history, options)?;
        let required = self.config.min_history(granularity).max(2);

        let (points, degraded) = if history.is_empty() {
            let baseline = options.fallback_mean.unwrap_or(0.0);
            (
                self.flat_projection(&dates, baseline),
                Some(DegradedReason::EmptyHistory),
            )
        } else if history.len() < required {
            tracing::debug!(
                available = history.len(),
                required,
                granularity = granularity.as_str(),
                "Insufficient history, using flat projection"
            );
            let baseline = mean_total(history).unwrap_or(0.0);
            (
                self.flat_projection(&dates, baseline),
                Some(DegradedReason::InsufficientHistory {
                    available: history.len(),
                    required,
                }),
            )
        } else {
            (self.fitted_projection(history, granularity, &dates), None)
        };

        let description = match degraded {
            Some(reason) => self.degraded_description(reason),
            None => self.coverage_description(),
        };
        let summary = self.summarize(
            history,
            &points,
            granularity,
            options.fallback_mean,
            description,
            degraded,
        );

        tracing::debug!(
            granularity = granularity.as_str(),
            periods = points.len(),
            total = summary.total_forecasted,
            trend = summary.trend.as_str(),
            degraded = degraded.is_some(),
            "Forecast complete"
        );

        Ok(ForecastResult {
            points,
            summary,
            metadata: ForecastMetadata::from_history(history, granularity),
        })
    }

    /// Description used for a flat fallback projection
    pub fn degraded_description(&self, reason: DegradedReason) -> String {
        format!(
            "±{:.0}% band around the historical mean ({})",
            self.config.degraded_band_fraction * 100.0,
            reason
        )
    }

    /// Summary statistics for a set of projected points
    ///
    /// Trend compares the projected mean with the historical mean (or the
    /// baseline when history is empty) against the configured threshold.
    pub fn summarize(
        &self,
        history: &[AggregatedBucket],
        points: &[ForecastPoint],
        granularity: Granularity,
        baseline: Option<f64>,
        confidence_description: String,
        degraded: Option<DegradedReason>,
    ) -> ForecastSummary {
        let historical_mean = mean_total(history)
            .or(baseline)
            .unwrap_or(0.0);
        let total_forecasted: f64 = points.iter().map(|p| p.predicted_amount).sum();
        let total_days: i64 = points
            .iter()
            .map(|p| granularity.days_in_bucket(p.date))
            .sum();
        let mean_daily_expenditure = if total_days > 0 {
            total_forecasted / total_days as f64
        } else {
            0.0
        };

        let forecast_mean = if points.is_empty() {
            0.0
        } else {
            total_forecasted / points.len() as f64
        };
        let percent_change_vs_historical = if historical_mean > 0.0 {
            Some((forecast_mean - historical_mean) / historical_mean * 100.0)
        } else {
            None
        };
        let threshold = self.config.trend_threshold_pct;
        let trend = match percent_change_vs_historical {
            Some(pct) if pct > threshold => Trend::Increasing,
            Some(pct) if pct < -threshold => Trend::Decreasing,
            Some(_) => Trend::Stable,
            None if forecast_mean > 0.0 => Trend::Increasing,
            None => Trend::Stable,
        };

        ForecastSummary {
            total_forecasted,
            mean_daily_expenditure,
            historical_mean,
            percent_change_vs_historical,
            forecast_periods: points.len(),
            confidence_description,
            trend,
            granularity,
            degraded,
        }
    }

    /// Flat projection of `baseline` with a fixed-fraction band
    pub fn flat_projection(&self, dates: &[NaiveDate], baseline: f64) -> Vec<ForecastPoint> {
        let level = baseline.max(0.0);
        let width = level * self.config.degraded_band_fraction;
        dates
            .iter()
            .map(|&date| ForecastPoint {
                date,
                predicted_amount: level,
                lower_bound: (level - width).max(0.0),
                upper_bound: level + width,
            })
            .collect()
    }

    /// Start dates of the buckets to project
    pub fn projection_dates(
        &self,
        history: &[AggregatedBucket],
        options: &ForecastOptions,
    ) -> Result<Vec<NaiveDate>> {
        let granularity = options.granularity;
        if options.horizon > MAX_HORIZON {
            return Err(Error::InvalidInput(format!(
                "forecast horizon must be at most {} buckets, got {}",
                MAX_HORIZON, options.horizon
            )));
        }
        let overflow = || Error::InvalidInput("forecast runs past the calendar range".to_string());

        let mut next = match history.last() {
            Some(last) => granularity.next_start(last.start).ok_or_else(overflow)?,
            None => granularity.bucket_start(
                options
                    .anchor
                    .unwrap_or_else(|| Utc::now().date_naive()),
            ),
        };

        let mut dates = Vec::with_capacity(options.horizon);
        for i in 0..options.horizon {
            dates.push(next);
            if i + 1 < options.horizon {
                next = granularity.next_start(next).ok_or_else(overflow)?;
            }
        }
        Ok(dates)
    }

    fn fitted_projection(
        &self,
        history: &[AggregatedBucket],
        granularity: Granularity,
        dates: &[NaiveDate],
    ) -> Vec<ForecastPoint> {
        let offsets = (granularity == Granularity::Daily && history.len() >= 2 * WEEK)
            .then(|| weekday_offsets(history));

        let series: Vec<f64> = history
            .iter()
            .map(|b| b.total_amount - offset_for(&offsets, b.start))
            .collect();

        let fit = fit(&series);
        let z = inverse_normal_cdf((1.0 + self.config.confidence) / 2.0);

        tracing::debug!(
            alpha = fit.alpha,
            beta = fit.beta,
            sigma = fit.sigma,
            seasonal = offsets.is_some(),
            "Fitted damped trend"
        );

        dates
            .iter()
            .zip(fit.path(dates.len()))
            .map(|(&date, (projected, spread))| {
                let estimate = projected + offset_for(&offsets, date);
                let width = z * spread;
                ForecastPoint {
                    date,
                    predicted_amount: estimate.max(0.0),
                    lower_bound: (estimate - width).max(0.0),
                    upper_bound: (estimate + width).max(0.0),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn daily(values: &[f64]) -> Vec<AggregatedBucket> {
        let start = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(); // Monday
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                let date = start + chrono::Duration::days(i as i64);
                AggregatedBucket {
                    period_label: Granularity::Daily.label(date),
                    start: date,
                    total_amount: v,
                    count: 1,
                }
            })
            .collect()
    }

    fn assert_bounds_ordered(points: &[ForecastPoint]) {
        for p in points {
            assert!(0.0 <= p.lower_bound, "{:?}", p);
            assert!(p.lower_bound <= p.predicted_amount, "{:?}", p);
            assert!(p.predicted_amount <= p.upper_bound, "{:?}", p);
        }
    }

    #[test]
    fn test_constant_series_has_zero_width_band() {
        let engine = ForecastEngine::default();
        let history = daily(&[10.0; 7]);
        let result = engine
            .forecast(&history, &ForecastOptions::new(Granularity::Daily))
            .unwrap();

        assert_eq!(result.points.len(), 7);
        for p in &result.points {
            assert!((p.predicted_amount - 10.0).abs() < 1e-9);
            assert_eq!(p.lower_bound, p.upper_bound);
        }
        assert_eq!(result.summary.trend, Trend::Stable);
        assert!(result.summary.degraded.is_none());
        assert_eq!(result.summary.confidence_description, "80% prediction interval");
        assert_eq!(
            result.points[0].date,
            NaiveDate::from_ymd_opt(2025, 9, 8).unwrap()
        );
    }

    #[test]
    fn test_empty_history_degrades_to_zero() {
        let engine = ForecastEngine::default();
        let anchor = NaiveDate::from_ymd_opt(2025, 10, 23).unwrap();
        let result = engine
            .forecast(
                &[],
                &ForecastOptions::new(Granularity::Weekly).with_anchor(anchor),
            )
            .unwrap();

        assert_eq!(result.points.len(), 4);
        assert!(result.points.iter().all(|p| p.predicted_amount == 0.0
            && p.lower_bound == 0.0
            && p.upper_bound == 0.0));
        assert_eq!(result.summary.degraded, Some(DegradedReason::EmptyHistory));
        assert_eq!(result.summary.trend, Trend::Stable);
        assert_eq!(
            result.points[0].date,
            NaiveDate::from_ymd_opt(2025, 10, 20).unwrap()
        );
        assert!(result.metadata.historical_date_range.is_none());
    }

    #[test]
    fn test_empty_history_uses_fallback_mean() {
        let engine = ForecastEngine::default();
        let options = ForecastOptions::new(Granularity::Weekly)
            .with_anchor(NaiveDate::from_ymd_opt(2025, 10, 20).unwrap())
            .with_fallback_mean(200.0);
        let result = engine.forecast(&[], &options).unwrap();

        let p = &result.points[0];
        assert_eq!(p.predicted_amount, 200.0);
        assert_eq!(p.lower_bound, 100.0);
        assert_eq!(p.upper_bound, 300.0);
        assert_eq!(result.summary.total_forecasted, 800.0);
        assert_eq!(result.summary.historical_mean, 200.0);
        assert_eq!(result.summary.trend, Trend::Stable);
    }

    #[test]
    fn test_short_history_degrades_to_mean() {
        let engine = ForecastEngine::default();
        let history = daily(&[10.0, 20.0, 30.0]);
        let result = engine
            .forecast(&history, &ForecastOptions::new(Granularity::Daily))
            .unwrap();

        assert_eq!(
            result.summary.degraded,
            Some(DegradedReason::InsufficientHistory {
                available: 3,
                required: 7
            })
        );
        assert!(result.points.iter().all(|p| p.predicted_amount == 20.0));
        assert!(result
            .summary
            .confidence_description
            .contains("insufficient history"));
        assert_bounds_ordered(&result.points);
    }

    #[test]
    fn test_increasing_series() {
        let engine = ForecastEngine::default();
        let values: Vec<f64> = (0..10).map(|i| 10.0 + 5.0 * i as f64).collect();
        let result = engine
            .forecast(&daily(&values), &ForecastOptions::new(Granularity::Daily))
            .unwrap();

        assert_eq!(result.summary.trend, Trend::Increasing);
        assert!(result.summary.percent_change_vs_historical.unwrap() > 5.0);
        assert!(result.points[0].predicted_amount > 55.0);
        assert_bounds_ordered(&result.points);
    }

    #[test]
    fn test_declining_series_clamps_at_zero() {
        let engine = ForecastEngine::default();
        let values: Vec<f64> = (0..8).map(|i| 70.0 - 10.0 * i as f64).collect();
        let result = engine
            .forecast(&daily(&values), &ForecastOptions::new(Granularity::Daily))
            .unwrap();

        assert_eq!(result.summary.trend, Trend::Decreasing);
        assert!(result.points.iter().all(|p| p.predicted_amount >= 0.0));
        assert_bounds_ordered(&result.points);
    }

    #[test]
    fn test_noisy_series_has_positive_width() {
        let engine = ForecastEngine::default();
        let values = [12.0, 30.0, 8.0, 25.0, 14.0, 40.0, 9.0, 22.0];
        let result = engine
            .forecast(&daily(&values), &ForecastOptions::new(Granularity::Daily))
            .unwrap();

        assert!(result
            .points
            .iter()
            .all(|p| p.upper_bound > p.predicted_amount));
        assert_bounds_ordered(&result.points);
    }

    #[test]
    fn test_spread_grows_with_horizon() {
        let fit = fit(&[12.0, 30.0, 8.0, 25.0, 14.0, 40.0, 9.0, 22.0]);
        assert!(fit.sigma > 0.0);
        let path = fit.path(7);
        assert_eq!(path.len(), 7);
        for pair in path.windows(2) {
            assert!(pair[1].1 >= pair[0].1);
        }
        assert_eq!(path[0].1, fit.sigma);
    }

    #[test]
    fn test_path_matches_closed_form() {
        let fit = HoltFit {
            alpha: 0.5,
            beta: 0.2,
            level: 100.0,
            trend: 4.0,
            sigma: 2.0,
        };
        let path = fit.path(3);

        // h=1: phi; h=2: phi + phi^2; h=3: phi + phi^2 + phi^3
        assert!((path[0].0 - (100.0 + 0.9 * 4.0)).abs() < 1e-9);
        assert!((path[2].0 - (100.0 + (0.9 + 0.81 + 0.729) * 4.0)).abs() < 1e-9);

        // variance(3) = 1 + (a(1 + b*0.9))^2 + (a(1 + b*1.71))^2
        let c1: f64 = 0.5 * (1.0 + 0.2 * 0.9);
        let c2: f64 = 0.5 * (1.0 + 0.2 * 1.71);
        let expected = 2.0 * (1.0 + c1 * c1 + c2 * c2).sqrt();
        assert!((path[2].1 - expected).abs() < 1e-9);
    }

    #[test]
    fn test_weekday_seasonality() {
        let engine = ForecastEngine::default();
        // Weekends are expensive
        let week = [10.0, 10.0, 10.0, 10.0, 10.0, 40.0, 40.0];
        let values: Vec<f64> = week.iter().cycle().take(21).copied().collect();
        let result = engine
            .forecast(&daily(&values), &ForecastOptions::new(Granularity::Daily))
            .unwrap();

        // Forecast starts on a Monday; Saturday is index 5
        let monday = result.points[0].predicted_amount;
        let saturday = result.points[5].predicted_amount;
        assert!(saturday > monday + 20.0, "{} vs {}", saturday, monday);
        assert_bounds_ordered(&result.points);
    }

    #[test]
    fn test_forecast_is_deterministic() {
        let engine = ForecastEngine::default();
        let values = [5.0, 17.0, 3.0, 22.0, 11.0, 9.0, 14.0, 30.0, 2.0];
        let options = ForecastOptions::new(Granularity::Daily);
        let a = engine.forecast(&daily(&values), &options).unwrap();
        let b = engine.forecast(&daily(&values), &options).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_mean_daily_expenditure_for_monthly() {
        let engine = ForecastEngine::default();
        let options = ForecastOptions::new(Granularity::Monthly)
            .with_anchor(NaiveDate::from_ymd_opt(2025, 1, 15).unwrap())
            .with_fallback_mean(300.0);
        let result = engine.forecast(&[], &options).unwrap();

        // Jan + Feb + Mar 2025 = 90 days
        assert!((result.summary.mean_daily_expenditure - 900.0 / 90.0).abs() < 1e-9);
        assert_eq!(result.summary.forecast_periods, 3);
    }

    #[test]
    fn test_invalid_options_rejected() {
        let engine = ForecastEngine::default();
        let zero = ForecastOptions::new(Granularity::Daily).with_horizon(0);
        assert!(matches!(
            engine.forecast(&[], &zero),
            Err(Error::InvalidInput(_))
        ));

        let negative = ForecastOptions::new(Granularity::Daily).with_fallback_mean(-1.0);
        assert!(engine.forecast(&[], &negative).is_err());
    }

    #[test]
    fn test_horizon_limit() {
        let engine = ForecastEngine::default();
        let history = daily(&[12.0, 30.0, 8.0, 25.0, 14.0, 40.0, 9.0, 22.0]);

        let longest = ForecastOptions::new(Granularity::Daily).with_horizon(MAX_HORIZON);
        let result = engine.forecast(&history, &longest).unwrap();
        assert_eq!(result.points.len(), MAX_HORIZON);
        assert_bounds_ordered(&result.points);

        for horizon in [MAX_HORIZON + 1, usize::MAX] {
            let options = ForecastOptions::new(Granularity::Daily).with_horizon(horizon);
            match engine.forecast(&history, &options) {
                Err(Error::InvalidInput(msg)) => assert!(msg.contains("at most 366")),
                other => panic!("expected InvalidInput, got {:?}", other),
            }
            assert!(engine.projection_dates(&[], &options).is_err());
        }
    }

    #[test]
    fn test_inverse_normal_cdf() {
        assert!((inverse_normal_cdf(0.5)).abs() < 1e-9);
        assert!((inverse_normal_cdf(0.9) - 1.281_551_6).abs() < 1e-6);
        assert!((inverse_normal_cdf(0.975) - 1.959_964).abs() < 1e-6);
        assert!((inverse_normal_cdf(0.01) + 2.326_348).abs() < 1e-6);
    }
}
