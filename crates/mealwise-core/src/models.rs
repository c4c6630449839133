//! Data models shared by the forecast and insight engines

use chrono::{DateTime, Datelike, Duration, FixedOffset, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Default estimated cash value of one meal credit
pub const DEFAULT_MEAL_CREDIT_VALUE: f64 = 12.0;

/// Default length of a meal-plan period in weeks
pub const DEFAULT_PERIOD_WEEKS: u32 = 16;

/// A student's budget snapshot for the current period
///
/// Field aliases accept the naming used by the profile store
/// (`total_budget`, `swipes_used`, ...) as well as camelCase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetState {
    #[serde(default)]
    pub name: String,
    #[serde(alias = "total_budget", alias = "budgetTotal")]
    pub budget_total: f64,
    #[serde(alias = "total_spent", alias = "budgetSpent")]
    pub budget_spent: f64,
    #[serde(alias = "total_swipes", alias = "mealCreditsTotal")]
    pub meal_credits_total: u32,
    #[serde(alias = "swipes_used", alias = "mealCreditsUsed")]
    pub meal_credits_used: u32,
    #[serde(alias = "total_flex", alias = "flexTotal")]
    pub flex_total: f64,
    #[serde(alias = "flexSpent")]
    pub flex_spent: f64,
    #[serde(alias = "weeksRemaining")]
    pub weeks_remaining: u32,
    /// Dietary flags, cuisine affinities, priority weights. Carried opaquely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<serde_json::Value>,
}

impl BudgetState {
    /// Check the invariants that callers are responsible for
    ///
    /// Money fields must be finite and non-negative, meal credits used may
    /// not exceed the total and `weeks_remaining` must fit in the period.
    /// Flex may be overspent; that is a valid state.
    pub fn validate(&self, period_weeks: u32) -> Result<()> {
        let money = [
            ("budget_total", self.budget_total),
            ("budget_spent", self.budget_spent),
            ("flex_total", self.flex_total),
            ("flex_spent", self.flex_spent),
        ];
        for (field, value) in money {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidInput(format!(
                    "{} must be a non-negative amount, got {}",
                    field, value
                )));
            }
        }

        if self.meal_credits_used > self.meal_credits_total {
            return Err(Error::InvalidInput(format!(
                "meal_credits_used ({}) exceeds meal_credits_total ({})",
                self.meal_credits_used, self.meal_credits_total
            )));
        }

        if self.weeks_remaining > period_weeks {
            return Err(Error::InvalidInput(format!(
                "weeks_remaining ({}) exceeds the period length ({})",
                self.weeks_remaining, period_weeks
            )));
        }

        Ok(())
    }

    /// Meal credits not yet used
    ///
    /// [`BudgetState::validate`] rejects overuse at the boundary, so reaching
    /// it here means state was built unchecked. Debug builds panic; release
    /// builds clamp to zero.
    pub fn meal_credits_remaining(&self) -> u32 {
        debug_assert!(
            self.meal_credits_used <= self.meal_credits_total,
            "meal credits used ({}) exceed total ({})",
            self.meal_credits_used,
            self.meal_credits_total
        );

        if self.meal_credits_used > self.meal_credits_total {
            tracing::warn!(
                used = self.meal_credits_used,
                total = self.meal_credits_total,
                "Meal credits used exceed total, clamping remaining to 0"
            );
            return 0;
        }

        self.meal_credits_total - self.meal_credits_used
    }

    /// Flex balance left (negative when overspent)
    pub fn flex_remaining(&self) -> f64 {
        self.flex_total - self.flex_spent
    }

    /// Amount spent beyond the overall budget (negative when under)
    pub fn budget_overage(&self) -> f64 {
        self.budget_spent - self.budget_total
    }

    /// Spend as a percentage of the overall budget
    pub fn budget_used_pct(&self) -> f64 {
        percent_of(self.budget_spent, self.budget_total)
    }

    /// Flex spend as a percentage of the flex total
    pub fn flex_used_pct(&self) -> f64 {
        percent_of(self.flex_spent, self.flex_total)
    }

    /// Weeks of the period already behind us
    pub fn weeks_elapsed(&self, period_weeks: u32) -> u32 {
        period_weeks.saturating_sub(self.weeks_remaining)
    }

    /// Average spend per elapsed week, if any week has elapsed
    pub fn weekly_pace(&self, period_weeks: u32) -> Option<f64> {
        let elapsed = self.weeks_elapsed(period_weeks);
        if elapsed == 0 {
            return None;
        }
        Some(self.budget_spent / elapsed as f64)
    }

    /// Total spend at period end if the current weekly pace continues
    pub fn projected_total_spend(&self, period_weeks: u32) -> Option<f64> {
        self.weekly_pace(period_weeks)
            .map(|pace| self.budget_spent + pace * self.weeks_remaining as f64)
    }
}

/// `part` as a percentage of `whole`, 0 when `whole` is 0
pub fn percent_of(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole * 100.0
    } else {
        0.0
    }
}

/// Which pool paid for a purchase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FundingSource {
    MealCredit,
    Flex,
    ExternalCash,
}

impl FundingSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            FundingSource::MealCredit => "meal_credit",
            FundingSource::Flex => "flex",
            FundingSource::ExternalCash => "external_cash",
        }
    }

    /// Infer the funding source from a free-form type label
    ///
    /// "swipe"/"meal" family maps to meal credits, "flex" to flex, anything
    /// else to external cash.
    pub fn infer(label: &str) -> Self {
        let label = label.to_lowercase();
        if label.contains("swipe") || label.contains("meal") {
            FundingSource::MealCredit
        } else if label.contains("flex") {
            FundingSource::Flex
        } else {
            FundingSource::ExternalCash
        }
    }
}

impl fmt::Display for FundingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A canonical purchase event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub merchant: String,
    pub amount: f64,
    pub funding_source: FundingSource,
    pub timestamp: DateTime<FixedOffset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl TransactionRecord {
    /// Calendar date of this purchase in the given local offset
    pub fn local_date(&self, offset: &FixedOffset) -> NaiveDate {
        self.timestamp.with_timezone(offset).date_naive()
    }
}

/// Time bucket width used for aggregation and forecasting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Daily,
    Weekly,
    Monthly,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }

    /// Singular name of one bucket ("day", "week", "month")
    pub fn noun(&self) -> &'static str {
        match self {
            Self::Daily => "day",
            Self::Weekly => "week",
            Self::Monthly => "month",
        }
    }

    /// Number of points a forecast projects by default
    pub fn default_horizon(&self) -> usize {
        match self {
            Self::Daily => 7,
            Self::Weekly => 4,
            Self::Monthly => 3,
        }
    }

    /// First day of the bucket containing `date`
    ///
    /// Weeks start on Monday (ISO); months on the 1st.
    pub fn bucket_start(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Self::Daily => date,
            Self::Weekly => {
                date - Duration::days(date.weekday().num_days_from_monday() as i64)
            }
            Self::Monthly => date.with_day(1).unwrap_or(date),
        }
    }

    /// Start of the bucket following the one starting at `start`
    pub fn next_start(&self, start: NaiveDate) -> Option<NaiveDate> {
        match self {
            Self::Daily => start.succ_opt(),
            Self::Weekly => start.checked_add_signed(Duration::days(7)),
            Self::Monthly => start.checked_add_months(Months::new(1)),
        }
    }

    /// Number of calendar days in the bucket starting at `start`
    pub fn days_in_bucket(&self, start: NaiveDate) -> i64 {
        match self {
            Self::Daily => 1,
            Self::Weekly => 7,
            Self::Monthly => self
                .next_start(start)
                .map(|next| (next - start).num_days())
                .unwrap_or(31),
        }
    }

    /// Human label for the bucket starting at `start`
    pub fn label(&self, start: NaiveDate) -> String {
        match self {
            Self::Daily => start.format("%Y-%m-%d").to_string(),
            Self::Weekly => {
                let week = start.iso_week();
                format!("{}-W{:02}", week.year(), week.week())
            }
            Self::Monthly => start.format("%Y-%m").to_string(),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "daily" | "day" => Ok(Self::Daily),
            "weekly" | "week" => Ok(Self::Weekly),
            "monthly" | "month" => Ok(Self::Monthly),
            _ => Err(Error::InvalidInput(format!(
                "Unknown granularity: {} (valid: daily, weekly, monthly)",
                s
            ))),
        }
    }
}

/// Total spend in one time bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedBucket {
    pub period_label: String,
    /// First calendar day of the bucket
    pub start: NaiveDate,
    pub total_amount: f64,
    pub count: usize,
}
