//! The transaction record stored in the staging and history collections.
//!
//! Records are loosely typed JSON objects written by the client. Every field
//! may be absent or have an unexpected type, so the accessors here return
//! `None` instead of failing and the aggregators exclude what they cannot use.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A (year, month tag) pair identifying one reporting interval.
///
/// Periods order by year first, then tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Period {
    /// The calendar year, taken from the first four characters of the record's date.
    pub year: i64,
    /// The period label within the year, usually the month number.
    pub tag: i64,
}

impl Period {
    /// Create a new period.
    pub fn new(year: i64, tag: i64) -> Self {
        Self { year, tag }
    }
}

/// An expense or income as stored by the client.
///
/// The record keeps every field it was created with, so writing it back out
/// loses nothing the client added.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionRecord(Map<String, Value>);

impl TransactionRecord {
    /// Wrap a JSON object as a transaction record.
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// The raw JSON fields of the record.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// The year from the first four characters of `date`.
    pub fn year(&self) -> Option<i64> {
        let date = self.0.get("date")?.as_str()?;
        let prefix = date.get(..4)?;

        if prefix.bytes().all(|byte| byte.is_ascii_digit()) {
            prefix.parse().ok()
        } else {
            None
        }
    }

    /// The period label, read from `month_tag` and falling back to `tag`.
    pub fn month_tag(&self) -> Option<i64> {
        self.0
            .get("month_tag")
            .and_then(int_like)
            .or_else(|| self.0.get("tag").and_then(int_like))
    }

    /// The (year, tag) pair, if both can be resolved.
    pub fn period(&self) -> Option<Period> {
        Some(Period::new(self.year()?, self.month_tag()?))
    }

    /// The transaction type, e.g. "Expense" or "Income".
    pub fn kind(&self) -> Option<&str> {
        self.0.get("type").and_then(Value::as_str)
    }

    /// The category, or `None` if it is absent or empty.
    pub fn category(&self) -> Option<&str> {
        self.non_empty_str("category")
    }

    /// The subcategory, or `None` if it is absent or empty.
    pub fn subcategory(&self) -> Option<&str> {
        self.non_empty_str("subcategory")
    }

    /// The magnitude of the transaction, read from `debit` and falling back
    /// to `amount`. A record with neither counts as zero.
    pub fn amount(&self) -> f64 {
        self.0
            .get("debit")
            .and_then(number_like)
            .or_else(|| self.0.get("amount").and_then(number_like))
            .unwrap_or(0.0)
            .abs()
    }

    /// The magnitude of the `debit` field only. A record without one counts as zero.
    pub fn debit(&self) -> f64 {
        self.0
            .get("debit")
            .and_then(number_like)
            .unwrap_or(0.0)
            .abs()
    }

    /// The record's identifier in string form, so `1` and `"1"` compare equal.
    pub fn id(&self) -> Option<String> {
        match self.0.get("id")? {
            Value::Null => None,
            Value::String(id) => Some(id.clone()),
            other => Some(other.to_string()),
        }
    }

    fn non_empty_str(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
    }
}

/// Interpret a JSON value as an integer.
///
/// Accepts integers, floats with no fractional part and numeric strings.
pub fn int_like(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|float| float.fract() == 0.0)
                .map(|float| float as i64)
        }),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Interpret a JSON value as a number, accepting numeric strings.
pub fn number_like(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Deserialize a list of integer-like values, dropping entries that are not
/// integer-like. `null` deserializes as an empty list.
pub fn int_like_list<'de, D>(deserializer: D) -> Result<Vec<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let values: Option<Vec<Value>> = Option::deserialize(deserializer)?;

    Ok(values.unwrap_or_default().iter().filter_map(int_like).collect())
}

/// Deserialize `null` as the type's default value.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::deserialize(deserializer)?.unwrap_or_default())
}
