//! The older, narrower statistics endpoints.
//!
//! These filter on `tags` and `years` independently rather than as (year,
//! tag) pairs, treat "All" as no type filter and only read the `debit` field
//! of each record.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    Error,
    record::{Period, TransactionRecord, int_like_list, null_as_default},
    stats::{Tally, round2},
};

/// The value of `type` or `category` that disables the filter.
const WILDCARD: &str = "All";
const INCOME: &str = "Income";
const CATEGORY_LAST3_COUNT: usize = 3;

/// Independent filters shared by the legacy endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LegacyFilter {
    /// Tags a record must have one of. Empty matches every record.
    #[serde(default, deserialize_with = "int_like_list")]
    pub tags: Vec<i64>,
    /// Years a record must be in one of. Empty matches every record.
    #[serde(default, deserialize_with = "int_like_list")]
    pub years: Vec<i64>,
    /// The transaction type to match. Absent, empty or "All" matches every type.
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// The category to match. Absent, empty or "All" matches every category.
    #[serde(default)]
    pub category: Option<String>,
    /// Subcategories a record must have one of. Empty matches every record.
    #[serde(default, deserialize_with = "null_as_default")]
    pub subcategories: Vec<String>,
}

fn active(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .filter(|value| !value.is_empty() && *value != WILDCARD)
}

impl LegacyFilter {
    fn matches(&self, record: &TransactionRecord) -> bool {
        if !self.tags.is_empty()
            && !record
                .month_tag()
                .is_some_and(|tag| self.tags.contains(&tag))
        {
            return false;
        }

        if !self.years.is_empty() && !record.year().is_some_and(|year| self.years.contains(&year)) {
            return false;
        }

        if let Some(kind) = active(&self.kind) {
            if record.kind() != Some(kind) {
                return false;
            }
        }

        if let Some(category) = active(&self.category) {
            if record.category() != Some(category) {
                return false;
            }
        }

        if !self.subcategories.is_empty()
            && !record.subcategory().is_some_and(|subcategory| {
                self.subcategories.iter().any(|name| name == subcategory)
            })
        {
            return false;
        }

        true
    }

    fn apply<'r>(
        &self,
        history: &'r [TransactionRecord],
    ) -> impl Iterator<Item = &'r TransactionRecord> {
        history.iter().filter(|record| self.matches(record))
    }
}

/// Mean, extremes and count of the matching debits.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LegacySummary {
    /// The mean debit.
    pub mean: f64,
    /// The largest debit.
    pub max: f64,
    /// The smallest debit.
    pub min: f64,
    /// The number of matching records.
    pub count: usize,
}

/// The mean of the debits with one tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagMean {
    /// The month tag.
    pub tag: i64,
    /// The mean debit of the records with the tag.
    pub mean: f64,
    /// The number of records with the tag.
    pub count: usize,
}

/// Mean debits per tag, with years merged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagMeans {
    /// One entry per tag, ascending by tag.
    pub per_tag: Vec<TagMean>,
    /// The mean debit over every tagged match.
    pub overall_mean: f64,
    /// The number of tagged matches.
    pub count: usize,
}

/// A request naming the category to average over its last three tags.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryRequest {
    /// The category to average. Required.
    #[serde(default)]
    pub category: Option<String>,
}

/// The mean debits of a category in its three highest tags.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryLast3 {
    /// The requested category.
    pub category: String,
    /// Up to three tags, ascending.
    pub months: Vec<TagMean>,
}

/// The mean income of one (category, subcategory) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncomeGroup {
    /// The category, empty if the records have none.
    pub category: String,
    /// The subcategory, empty if the records have none.
    pub subcategory: String,
    /// The mean debit of the group.
    pub mean: f64,
    /// The number of records in the group.
    pub count: usize,
}

/// Mean income per (category, subcategory).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncomeMeans {
    /// One entry per pair, sorted by the pair.
    pub groups: Vec<IncomeGroup>,
    /// The mean debit over every income record that matched.
    pub overall_mean: f64,
    /// The number of income records that matched.
    pub count: usize,
}

/// Totals of one (year, tag) period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RollupRow {
    /// The year of the period.
    pub year: i64,
    /// The month tag of the period.
    pub tag: i64,
    /// The sum of the debits.
    pub total: f64,
    /// The mean debit.
    pub mean: f64,
    /// The number of records.
    pub count: usize,
}

/// Totals per (year, tag) period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rollup {
    /// One row per period, sorted by (year, tag).
    pub rows: Vec<RollupRow>,
}

fn tag_means(tallies: BTreeMap<i64, Tally>) -> Vec<TagMean> {
    tallies
        .into_iter()
        .map(|(tag, tally)| TagMean {
            tag,
            mean: round2(tally.mean()),
            count: tally.count,
        })
        .collect()
}

/// Summarize the debits of the records that match `filter`.
pub fn summary(filter: &LegacyFilter, history: &[TransactionRecord]) -> LegacySummary {
    let debits: Vec<f64> = filter.apply(history).map(TransactionRecord::debit).collect();

    if debits.is_empty() {
        return LegacySummary::default();
    }

    let mut tally = Tally::default();
    debits.iter().for_each(|debit| tally.add(*debit));

    LegacySummary {
        mean: round2(tally.mean()),
        max: round2(debits.iter().copied().fold(f64::MIN, f64::max)),
        min: round2(debits.iter().copied().fold(f64::MAX, f64::min)),
        count: tally.count,
    }
}

/// The mean debit per tag, merging years, plus the mean over every tagged
/// match. Records without a tag are left out.
pub fn tag_means_by_tag(filter: &LegacyFilter, history: &[TransactionRecord]) -> TagMeans {
    let mut by_tag: BTreeMap<i64, Tally> = BTreeMap::new();
    let mut overall = Tally::default();

    for record in filter.apply(history) {
        let Some(tag) = record.month_tag() else { continue };

        by_tag.entry(tag).or_default().add(record.debit());
        overall.add(record.debit());
    }

    TagMeans {
        per_tag: tag_means(by_tag),
        overall_mean: round2(overall.mean()),
        count: overall.count,
    }
}

/// The mean debit of `category` in each of its three highest tags.
///
/// Tags are compared as numbers and years are ignored, so tag 12 of last year
/// ranks above tag 1 of this year.
///
/// # Errors
/// Returns [Error::InvalidPayload] if no category is given.
pub fn category_last3(
    request: &CategoryRequest,
    history: &[TransactionRecord],
) -> Result<CategoryLast3, Error> {
    let category = request
        .category
        .as_deref()
        .filter(|category| !category.is_empty())
        .ok_or_else(|| Error::InvalidPayload("'category' is required".to_owned()))?;

    let mut by_tag: BTreeMap<i64, Tally> = BTreeMap::new();

    for record in history.iter().filter(|record| record.category() == Some(category)) {
        if let Some(tag) = record.month_tag() {
            by_tag.entry(tag).or_default().add(record.debit());
        }
    }

    let skip = by_tag.len().saturating_sub(CATEGORY_LAST3_COUNT);
    let last3 = by_tag.into_iter().skip(skip).collect();

    Ok(CategoryLast3 {
        category: category.to_owned(),
        months: tag_means(last3),
    })
}

/// The mean income per (category, subcategory), sorted by the pair.
///
/// The `type` and `category` filters are ignored, only income is counted.
/// A missing category or subcategory groups as an empty string.
pub fn income_means(filter: &LegacyFilter, history: &[TransactionRecord]) -> IncomeMeans {
    let filter = LegacyFilter {
        kind: Some(INCOME.to_owned()),
        category: None,
        subcategories: Vec::new(),
        ..filter.clone()
    };

    let mut groups: BTreeMap<(String, String), Tally> = BTreeMap::new();
    let mut overall = Tally::default();

    for record in filter.apply(history) {
        let key = (
            record.category().unwrap_or_default().to_owned(),
            record.subcategory().unwrap_or_default().to_owned(),
        );

        groups.entry(key).or_default().add(record.debit());
        overall.add(record.debit());
    }

    IncomeMeans {
        groups: groups
            .into_iter()
            .map(|((category, subcategory), tally)| IncomeGroup {
                category,
                subcategory,
                mean: round2(tally.mean()),
                count: tally.count,
            })
            .collect(),
        overall_mean: round2(overall.mean()),
        count: overall.count,
    }
}

/// Totals and means per (year, tag), sorted by the pair.
///
/// Only the `tags`, `years` and `type` filters apply. Records without a
/// resolvable period are left out.
pub fn rollup(filter: &LegacyFilter, history: &[TransactionRecord]) -> Rollup {
    let filter = LegacyFilter {
        category: None,
        subcategories: Vec::new(),
        ..filter.clone()
    };

    let mut by_period: BTreeMap<Period, Tally> = BTreeMap::new();

    for record in filter.apply(history) {
        if let Some(period) = record.period() {
            by_period.entry(period).or_default().add(record.debit());
        }
    }

    Rollup {
        rows: by_period
            .into_iter()
            .map(|(period, tally)| RollupRow {
                year: period.year,
                tag: period.tag,
                total: round2(tally.total),
                mean: round2(tally.mean()),
                count: tally.count,
            })
            .collect(),
    }
}
