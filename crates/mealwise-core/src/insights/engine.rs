//! Insight Engine - evaluates diagnostic rules in priority order

use std::collections::HashMap;

use crate::aggregate::mean_total;
use crate::config::{Config, CreditsConfig, InsightConfig};
use crate::models::{AggregatedBucket, BudgetState, FundingSource, TransactionRecord};

use super::types::{InsightKind, InsightResult};
use super::{FlexOverspendRule, OnTrackRule, OverBudgetRule, SwipeWasteRule};

/// Inputs available to every rule
pub struct InsightContext<'a> {
    pub state: &'a BudgetState,
    /// Aggregated spend history, oldest first
    pub history: &'a [AggregatedBucket],
    /// Canonical transactions, when the caller has them
    pub transactions: &'a [TransactionRecord],
}

impl<'a> InsightContext<'a> {
    pub fn new(state: &'a BudgetState, history: &'a [AggregatedBucket]) -> Self {
        Self {
            state,
            history,
            transactions: &[],
        }
    }

    pub fn with_transactions(mut self, transactions: &'a [TransactionRecord]) -> Self {
        self.transactions = transactions;
        self
    }

    /// Category (or merchant) with the largest flex-funded total
    pub fn top_flex_contributor(&self) -> Option<(String, f64)> {
        let mut totals: HashMap<&str, f64> = HashMap::new();
        for tx in self
            .transactions
            .iter()
            .filter(|tx| tx.funding_source == FundingSource::Flex)
        {
            let key = tx.category.as_deref().unwrap_or(&tx.merchant);
            *totals.entry(key).or_insert(0.0) += tx.amount;
        }

        // Ties resolve alphabetically so the result never depends on hash order
        totals
            .into_iter()
            .filter(|(_, total)| *total > 0.0)
            .max_by(|(a_key, a), (b_key, b)| a.total_cmp(b).then_with(|| b_key.cmp(a_key)))
            .map(|(key, total)| (key.to_string(), total))
    }

    /// Share of transaction spend paid outside the meal plan, in percent
    pub fn external_share_pct(&self) -> Option<f64> {
        let total: f64 = self.transactions.iter().map(|tx| tx.amount).sum();
        if total <= 0.0 {
            return None;
        }
        let external: f64 = self
            .transactions
            .iter()
            .filter(|tx| tx.funding_source == FundingSource::ExternalCash)
            .map(|tx| tx.amount)
            .sum();
        Some(external / total * 100.0)
    }
}

/// A diagnostic rule
///
/// Rules are pure: the same context always yields the same result.
pub trait InsightRule: Send + Sync {
    /// Which diagnosis this rule produces
    fn kind(&self) -> InsightKind;

    /// Human-readable name
    fn name(&self) -> &'static str;

    /// Produce a result if the rule applies to this context
    fn evaluate(&self, ctx: &InsightContext<'_>) -> Option<InsightResult>;
}

/// Runs rules in priority order; the first match wins
pub struct InsightEngine {
    rules: Vec<Box<dyn InsightRule>>,
    fallback: OnTrackRule,
    trend_note_threshold_pct: f64,
}

impl Default for InsightEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl InsightEngine {
    /// Create an engine with the built-in rules and default thresholds
    pub fn new() -> Self {
        Self::with_settings(&CreditsConfig::default(), &InsightConfig::default())
    }

    /// Create an engine from loaded configuration
    pub fn from_config(config: &Config) -> Self {
        Self::with_settings(&config.credits, &config.insights)
    }

    pub fn with_settings(credits: &CreditsConfig, thresholds: &InsightConfig) -> Self {
        let mut engine = Self {
            rules: vec![],
            fallback: OnTrackRule::new(),
            trend_note_threshold_pct: thresholds.trend_note_threshold_pct,
        };

        // Registration order is evaluation priority
        engine.register(Box::new(SwipeWasteRule::new(credits, thresholds)));
        engine.register(Box::new(FlexOverspendRule::new(credits)));
        engine.register(Box::new(OverBudgetRule::new(credits, thresholds)));

        engine
    }

    /// Append a rule after the existing ones
    pub fn register(&mut self, rule: Box<dyn InsightRule>) {
        self.rules.push(rule);
    }

    /// Registered rules as (kind, name), in priority order
    pub fn rules(&self) -> Vec<(InsightKind, &'static str)> {
        self.rules
            .iter()
            .map(|r| (r.kind(), r.name()))
            .chain(std::iter::once((self.fallback.kind(), self.fallback.name())))
            .collect()
    }

    /// Derive insights from a budget snapshot and its history
    pub fn derive_insights(
        &self,
        state: &BudgetState,
        history: &[AggregatedBucket],
    ) -> InsightResult {
        self.evaluate(&InsightContext::new(state, history))
    }

    /// Evaluate all rules against a prepared context
    pub fn evaluate(&self, ctx: &InsightContext<'_>) -> InsightResult {
        let matched = self.rules.iter().find_map(|rule| {
            let result = rule.evaluate(ctx);
            if result.is_some() {
                tracing::debug!(rule = rule.kind().as_str(), "Insight rule matched");
            }
            result
        });

        let mut result = match matched {
            Some(result) => result,
            None => {
                tracing::debug!(rule = self.fallback.kind().as_str(), "No rule matched, using default");
                self.fallback.summarize(ctx)
            }
        };

        if let Some(note) = self.trend_note(ctx.history) {
            result.patterns.push(note);
        }
        result
    }

    /// Compare the latest bucket with the mean of the earlier ones
    fn trend_note(&self, history: &[AggregatedBucket]) -> Option<String> {
        let (latest, earlier) = history.split_last()?;
        let earlier_mean = mean_total(earlier)?;
        if earlier_mean <= 0.0 {
            return None;
        }

        let change = (latest.total_amount - earlier_mean) / earlier_mean * 100.0;
        if change.abs() < self.trend_note_threshold_pct {
            return None;
        }

        Some(format!(
            "Latest period ({}) spending of ${:.2} is {:.0}% {} your earlier average of ${:.2}",
            latest.period_label,
            latest.total_amount,
            change.abs(),
            if change > 0.0 { "above" } else { "below" },
            earlier_mean
        ))
    }
}
