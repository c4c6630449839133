//! Series aggregation into contiguous, gap-filled time buckets

use std::collections::BTreeMap;

use chrono::{FixedOffset, NaiveDate};

use crate::models::{AggregatedBucket, Granularity, TransactionRecord};

/// Buckets canonical transactions by local calendar day, ISO week or month
pub struct SeriesAggregator {
    offset: FixedOffset,
}

impl SeriesAggregator {
    /// Create an aggregator placing purchases on `offset`'s calendar
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Aggregate `records` into buckets of `granularity`
    ///
    /// The result spans the first to the last bucket touched by a record
    /// with empty buckets filled in as zero. Output depends only on the
    /// multiset of records, not their order: amounts within a bucket are
    /// summed in sorted order so float rounding is order-independent.
    pub fn aggregate(
        &self,
        records: &[TransactionRecord],
        granularity: Granularity,
    ) -> Vec<AggregatedBucket> {
        let mut amounts: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
        for record in records {
            let start = granularity.bucket_start(record.local_date(&self.offset));
            amounts.entry(start).or_default().push(record.amount);
        }

        let (first, last) = match (amounts.keys().next(), amounts.keys().next_back()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return Vec::new(),
        };

        let mut buckets = Vec::new();
        let mut cursor = Some(first);
        while let Some(start) = cursor.filter(|s| *s <= last) {
            let (total_amount, count) = match amounts.get_mut(&start) {
                Some(values) => {
                    values.sort_by(|a, b| a.total_cmp(b));
                    (values.iter().sum(), values.len())
                }
                None => (0.0, 0),
            };
            buckets.push(AggregatedBucket {
                period_label: granularity.label(start),
                start,
                total_amount,
                count,
            });
            cursor = granularity.next_start(start);
        }

        tracing::debug!(
            granularity = granularity.as_str(),
            transactions = records.len(),
            buckets = buckets.len(),
            "Aggregated series"
        );
        buckets
    }
}

/// Mean bucket total, `None` for an empty series
pub fn mean_total(buckets: &[AggregatedBucket]) -> Option<f64> {
    if buckets.is_empty() {
        return None;
    }
    Some(buckets.iter().map(|b| b.total_amount).sum::<f64>() / buckets.len() as f64)
}
