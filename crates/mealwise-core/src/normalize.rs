//! Transaction normalization
//!
//! Converts heterogeneous raw purchase records into canonical
//! [`TransactionRecord`]s. Field names are resolved through an explicit
//! synonym table; keys are compared case-insensitively with `_`, `-` and
//! spaces ignored, so `fundingSource`, `funding_source` and `Funding Source`
//! are the same field.
//!
//! Records that cannot be placed on the timeline (no amount, no timestamp)
//! are skipped and reported, never fatal.

use std::io::Read;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use csv::ReaderBuilder;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::models::{FundingSource, TransactionRecord};

/// Accepted field names per canonical field, in lookup order
const MERCHANT_FIELDS: &[&str] = &["merchant", "location", "vendor"];
const TIMESTAMP_FIELDS: &[&str] = &["timestamp", "date", "datetime"];
const AMOUNT_FIELDS: &[&str] = &["amount", "total", "price", "cost"];
const FUNDING_FIELDS: &[&str] = &["fundingsource", "type", "paymenttype", "category"];
const CATEGORY_FIELDS: &[&str] = &["category"];

/// Merchant used when a record names none
const UNKNOWN_MERCHANT: &str = "Unknown";

/// Why a raw record was left out of the canonical series
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(rename_all = "snake_case", tag = "kind", content = "detail")]
pub enum SkipReason {
    #[error("record is not an object")]
    NotAnObject,
    #[error("no amount field")]
    MissingAmount,
    #[error("unparseable amount: {0}")]
    InvalidAmount(String),
    #[error("negative amount: {0}")]
    NegativeAmount(f64),
    #[error("no timestamp field")]
    MissingTimestamp,
    #[error("unparseable timestamp: {0}")]
    InvalidTimestamp(String),
}

/// A raw record that was skipped, by position in the input
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRecord {
    pub index: usize,
    pub reason: SkipReason,
}

/// Canonical records plus the skipped-record report
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizedBatch {
    /// Ascending by timestamp, ties in input order
    pub records: Vec<TransactionRecord>,
    pub skipped: Vec<SkippedRecord>,
}

/// Tolerant parser for raw transaction records
pub struct TransactionNormalizer {
    offset: FixedOffset,
    cents_re: Regex,
}

impl TransactionNormalizer {
    /// Create a normalizer that reads offset-less timestamps in `offset`
    pub fn new(offset: FixedOffset) -> Result<Self> {
        Ok(Self {
            offset,
            cents_re: Regex::new(r"(?i)^\s*(\d+(?:\.\d+)?)\s*(?:cents?|¢)\s*$")?,
        })
    }

    /// Normalize a batch of raw records
    pub fn normalize(&self, raw: &[Value]) -> NormalizedBatch {
        let mut batch = NormalizedBatch::default();

        for (index, value) in raw.iter().enumerate() {
            match self.normalize_one(value) {
                Ok(record) => batch.records.push(record),
                Err(reason) => {
                    tracing::warn!(index, reason = %reason, "Skipping malformed transaction");
                    batch.skipped.push(SkippedRecord { index, reason });
                }
            }
        }

        // sort_by is stable: equal timestamps keep input order
        batch.records.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

        tracing::debug!(
            accepted = batch.records.len(),
            skipped = batch.skipped.len(),
            "Normalized transactions"
        );
        batch
    }

    /// Normalize one raw record
    pub fn normalize_one(&self, raw: &Value) -> std::result::Result<TransactionRecord, SkipReason> {
        let fields = raw.as_object().ok_or(SkipReason::NotAnObject)?;

        let amount = match lookup(fields, AMOUNT_FIELDS) {
            Some(value) => self.parse_amount(value)?,
            None => return Err(SkipReason::MissingAmount),
        };

        let timestamp = match lookup(fields, TIMESTAMP_FIELDS) {
            Some(Value::String(s)) => self
                .parse_timestamp(s)
                .ok_or_else(|| SkipReason::InvalidTimestamp(s.clone()))?,
            Some(other) => return Err(SkipReason::InvalidTimestamp(other.to_string())),
            None => return Err(SkipReason::MissingTimestamp),
        };

        let merchant = lookup_str(fields, MERCHANT_FIELDS)
            .unwrap_or(UNKNOWN_MERCHANT)
            .to_string();

        let funding_source = lookup_str(fields, FUNDING_FIELDS)
            .map(FundingSource::infer)
            .unwrap_or(FundingSource::ExternalCash);

        let category = lookup_str(fields, CATEGORY_FIELDS).map(str::to_string);

        Ok(TransactionRecord {
            merchant,
            amount,
            funding_source,
            timestamp,
            category,
        })
    }

    /// Extract a non-negative amount from a number or a string
    ///
    /// Strings may be currency-prefixed (`"$1,234.50"`) or phrased in cents
    /// (`"150 cents"`, `"75¢"`).
    fn parse_amount(&self, value: &Value) -> std::result::Result<f64, SkipReason> {
        let amount = match value {
            Value::Number(n) => n
                .as_f64()
                .ok_or_else(|| SkipReason::InvalidAmount(n.to_string()))?,
            Value::String(s) => {
                if let Some(caps) = self.cents_re.captures(s) {
                    let cents: f64 = caps[1]
                        .parse()
                        .map_err(|_| SkipReason::InvalidAmount(s.clone()))?;
                    cents / 100.0
                } else {
                    let cleaned = s
                        .trim()
                        .trim_start_matches("USD")
                        .trim_end_matches("USD")
                        .replace(['$', ',', ' '], "");
                    cleaned
                        .parse::<f64>()
                        .map_err(|_| SkipReason::InvalidAmount(s.clone()))?
                }
            }
            Value::Null => return Err(SkipReason::MissingAmount),
            other => return Err(SkipReason::InvalidAmount(other.to_string())),
        };

        if !amount.is_finite() {
            return Err(SkipReason::InvalidAmount(value.to_string()));
        }
        if amount < 0.0 {
            return Err(SkipReason::NegativeAmount(amount));
        }
        Ok(amount)
    }

    /// Parse an ISO-8601 timestamp; offset-less values use the local offset
    fn parse_timestamp(&self, s: &str) -> Option<DateTime<FixedOffset>> {
        let s = s.trim();

        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt);
        }
        for fmt in ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"] {
            if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
                return Some(dt);
            }
        }

        let naive_formats = [
            "%Y-%m-%dT%H:%M:%S%.f",
            "%Y-%m-%d %H:%M:%S%.f",
            "%Y-%m-%dT%H:%M",
            "%Y-%m-%d %H:%M",
        ];
        for fmt in naive_formats {
            if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
                return self.offset.from_local_datetime(&ndt).single();
            }
        }

        // Date only: midnight local time
        for fmt in ["%Y-%m-%d", "%m/%d/%Y"] {
            if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
                let ndt = date.and_hms_opt(0, 0, 0)?;
                return self.offset.from_local_datetime(&ndt).single();
            }
        }

        None
    }
}

/// Canonical form of a field name for synonym matching
fn canonical_key(key: &str) -> String {
    key.chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

/// First present, non-null field among `names`
fn lookup<'a>(fields: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|name| {
        fields
            .iter()
            .find(|(key, value)| !value.is_null() && canonical_key(key) == *name)
            .map(|(_, value)| value)
    })
}

/// First present, non-empty string field among `names`
fn lookup_str<'a>(fields: &'a Map<String, Value>, names: &[&str]) -> Option<&'a str> {
    names.iter().find_map(|name| {
        fields.iter().find_map(|(key, value)| match value {
            Value::String(s) if !s.trim().is_empty() && canonical_key(key) == *name => {
                Some(s.trim())
            }
            _ => None,
        })
    })
}

/// Raw records plus the optional user snapshot found next to them
#[derive(Debug, Clone, Default)]
pub struct RawInput {
    pub user_data: Option<Value>,
    pub transactions: Vec<Value>,
}

/// Split a JSON document into raw transactions and optional user data
///
/// Accepts a bare array of records, or an object holding a
/// `Transactions`/`transactions` array and optionally `UserData`/`user_data`.
pub fn extract_raw_input(doc: Value) -> Result<RawInput> {
    match doc {
        Value::Array(transactions) => Ok(RawInput {
            user_data: None,
            transactions,
        }),
        Value::Object(mut map) => {
            let transactions = ["Transactions", "transactions"]
                .iter()
                .find_map(|key| map.remove(*key));
            let transactions = match transactions {
                Some(Value::Array(items)) => items,
                Some(_) => {
                    return Err(Error::InvalidInput(
                        "transactions must be an array".to_string(),
                    ))
                }
                None => {
                    return Err(Error::InvalidInput(
                        "expected an array of transactions or an object with a transactions field"
                            .to_string(),
                    ))
                }
            };
            let user_data = ["UserData", "user_data", "userData"]
                .iter()
                .find_map(|key| map.remove(*key));
            Ok(RawInput {
                user_data,
                transactions,
            })
        }
        _ => Err(Error::InvalidInput(
            "expected a JSON array or object".to_string(),
        )),
    }
}

/// Read a CSV export into raw records, one object per row keyed by header
pub fn read_csv_records<R: Read>(reader: R) -> Result<Vec<Value>> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let mut records = Vec::new();

    for result in rdr.records() {
        let row = result?;
        let mut map = Map::new();
        for (header, value) in headers.iter().zip(row.iter()) {
            if !value.is_empty() {
                map.insert(header.to_string(), Value::String(value.to_string()));
            }
        }
        records.push(Value::Object(map));
    }

    Ok(records)
}

/// Narrows canonical records before aggregation
#[derive(Debug, Clone, PartialEq)]
pub enum TransactionFilter {
    Category(String),
    Merchant(String),
    FundingSource(FundingSource),
}

impl TransactionFilter {
    /// Build a filter from a `(filter_type, filter_value)` pair
    ///
    /// `filter_type` is one of `category`, `location`/`merchant` or `type`.
    pub fn parse(filter_type: &str, filter_value: &str) -> Result<Self> {
        let value = filter_value.trim();
        if value.is_empty() {
            return Err(Error::InvalidInput("filter value is empty".to_string()));
        }
        match filter_type.trim().to_lowercase().as_str() {
            "category" => Ok(Self::Category(value.to_string())),
            "location" | "merchant" => Ok(Self::Merchant(value.to_string())),
            "type" | "funding_source" => Ok(Self::FundingSource(FundingSource::infer(value))),
            other => Err(Error::InvalidInput(format!(
                "Unknown filter type: {} (valid: category, location, type)",
                other
            ))),
        }
    }

    pub fn matches(&self, record: &TransactionRecord) -> bool {
        match self {
            Self::Category(category) => record
                .category
                .as_deref()
                .is_some_and(|c| c.eq_ignore_ascii_case(category)),
            Self::Merchant(merchant) => record.merchant.eq_ignore_ascii_case(merchant),
            Self::FundingSource(source) => record.funding_source == *source,
        }
    }

    pub fn apply(&self, records: Vec<TransactionRecord>) -> Vec<TransactionRecord> {
        records.into_iter().filter(|r| self.matches(r)).collect()
    }

    /// Short description such as `category=Dining`
    pub fn describe(&self) -> String {
        match self {
            Self::Category(c) => format!("category={}", c),
            Self::Merchant(m) => format!("location={}", m),
            Self::FundingSource(s) => format!("type={}", s),
        }
    }
}
