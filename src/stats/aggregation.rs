//! The unified statistics request and the reduction of filtered records into
//! per-period totals, a summary and the top category breakdown.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    record::{Period, TransactionRecord, int_like_list, null_as_default},
    stats::{Tally, filter::RecordFilter, round2, selection::{QuickFilter, Selection}},
};

/// The fewest periods statistics are computed over.
pub const MIN_PERIODS: usize = 2;
/// How many groups the top breakdown lists.
const TOP_GROUP_COUNT: usize = 3;
const INSUFFICIENT_SELECTION: &str = "Select at least two periods to compute statistics.";

/// A request to the unified statistics endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsRequest {
    /// The years to select from `tags_by_year`.
    #[serde(default, deserialize_with = "int_like_list")]
    pub years: Vec<i64>,
    /// The tags to select in each year, keyed by the year as a string.
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags_by_year: Map<String, Value>,
    /// The transaction type records must have, e.g. "Expense".
    #[serde(rename = "type")]
    pub kind: String,
    /// The categories to include. Empty includes every category.
    #[serde(default, deserialize_with = "null_as_default")]
    pub categories: Vec<String>,
    /// The subcategories to include when exactly one category is selected.
    #[serde(default, deserialize_with = "null_as_default")]
    pub subcategories: Vec<String>,
    /// Derives the periods from the history instead, if set.
    #[serde(default, deserialize_with = "null_as_default")]
    pub quick_filter: QuickFilter,
}

/// The total of the matching records in one period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodTotal {
    /// The year of the period.
    pub year: i64,
    /// The month tag of the period.
    pub tag: i64,
    /// The sum of the absolute amounts, rounded to cents.
    pub total: f64,
    /// The number of records in the period.
    pub count: usize,
}

/// Distribution statistics over the per-period totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    /// The sum of the period totals.
    pub total_over_period: f64,
    /// The mean period total.
    pub avg_monthly: f64,
    /// The median period total.
    pub median_monthly: f64,
    /// The smallest period total.
    pub min_monthly: f64,
    /// The largest period total.
    pub max_monthly: f64,
}

/// One entry of the top category (or subcategory) breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    /// The category, or the subcategory when drilling into one category.
    pub name: String,
    /// The sum of the group's absolute amounts over every selected period.
    pub total: f64,
    /// The total divided by the number of selected periods.
    pub avg_per_month: f64,
}

/// The periods a response covers, in the same shape as the request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionView {
    /// The distinct selected years, ascending.
    pub years: Vec<i64>,
    /// The selected tags of each year, keyed by the year as a string.
    pub tags_by_year: BTreeMap<String, Vec<i64>>,
}

impl From<&Selection> for SelectionView {
    fn from(selection: &Selection) -> Self {
        Self {
            years: selection.years(),
            tags_by_year: selection.tags_by_year(),
        }
    }
}

/// The response of the unified statistics endpoint.
///
/// If fewer than [MIN_PERIODS] periods are selected, `error` is set and the
/// other fields are empty or zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsResponse {
    /// Why no statistics were computed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// The totals of every selected period in ascending order.
    pub months: Vec<PeriodTotal>,
    /// Statistics over the period totals.
    pub summary: Summary,
    /// The largest three groups by total.
    pub top_categories: Vec<CategoryTotal>,
    /// The periods the statistics cover.
    pub selection: SelectionView,
}

impl StatsResponse {
    fn insufficient(selection: &Selection) -> Self {
        Self {
            error: Some(INSUFFICIENT_SELECTION.to_owned()),
            months: Vec::new(),
            summary: Summary::default(),
            top_categories: Vec::new(),
            selection: selection.into(),
        }
    }
}

/// Compute the unified statistics for `request` over `history`.
///
/// Records whose period cannot be resolved are left out. The request is
/// answered with the insufficient-selection response instead of an error if
/// fewer than [MIN_PERIODS] periods are selected.
pub fn compute_stats(request: &StatsRequest, history: &[TransactionRecord]) -> StatsResponse {
    let selection = Selection::resolve(
        request.quick_filter,
        &request.years,
        &request.tags_by_year,
        history,
    );

    if selection.len() < MIN_PERIODS {
        tracing::debug!("only {} periods selected, not computing statistics", selection.len());
        return StatsResponse::insufficient(&selection);
    }

    let filter = RecordFilter::new(
        &selection,
        &request.kind,
        &request.categories,
        &request.subcategories,
    );
    let matches = filter.apply(history);

    let tallies = tally_periods(&selection, &matches);
    let totals: Vec<f64> = tallies.values().map(|tally| tally.total).collect();

    let months = tallies
        .iter()
        .map(|(period, tally)| PeriodTotal {
            year: period.year,
            tag: period.tag,
            total: round2(tally.total),
            count: tally.count,
        })
        .collect();

    StatsResponse {
        error: None,
        months,
        summary: summarize(&totals),
        top_categories: top_groups(&matches, filter.drills_down(), selection.len()),
        selection: (&selection).into(),
    }
}

/// Sum the matching records per period. Every selected period is present,
/// including those without records.
fn tally_periods(
    selection: &Selection,
    matches: &[(Period, &TransactionRecord)],
) -> BTreeMap<Period, Tally> {
    let mut tallies: BTreeMap<Period, Tally> = selection
        .periods()
        .map(|period| (period, Tally::default()))
        .collect();

    for (period, record) in matches {
        if let Some(tally) = tallies.get_mut(period) {
            tally.add(record.amount());
        }
    }

    tallies
}

fn summarize(totals: &[f64]) -> Summary {
    if totals.is_empty() {
        return Summary::default();
    }

    let sum: f64 = totals.iter().sum();
    let mean = sum / totals.len() as f64;

    let mut sorted = totals.to_vec();
    sorted.sort_by(f64::total_cmp);

    let middle = sorted.len() / 2;
    let median = if sorted.len() % 2 == 0 {
        (sorted[middle - 1] + sorted[middle]) / 2.0
    } else {
        sorted[middle]
    };

    Summary {
        total_over_period: round2(sum),
        avg_monthly: round2(mean),
        median_monthly: round2(median),
        min_monthly: round2(sorted[0]),
        max_monthly: round2(sorted[sorted.len() - 1]),
    }
}

/// The largest groups by total, grouped by subcategory when drilling down
/// and by category otherwise. Records without the grouping key are skipped.
fn top_groups(
    matches: &[(Period, &TransactionRecord)],
    by_subcategory: bool,
    period_count: usize,
) -> Vec<CategoryTotal> {
    let mut groups: Vec<(&str, f64)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for (_, record) in matches {
        let key = if by_subcategory {
            record.subcategory()
        } else {
            record.category()
        };
        let Some(key) = key else { continue };

        let position = *index.entry(key).or_insert_with(|| {
            groups.push((key, 0.0));
            groups.len() - 1
        });
        groups[position].1 += record.amount();
    }

    // Stable, so equal totals keep the order they were first seen in.
    groups.sort_by(|(_, a), (_, b)| b.total_cmp(a));

    groups
        .into_iter()
        .take(TOP_GROUP_COUNT)
        .map(|(name, total)| CategoryTotal {
            name: name.to_owned(),
            total: round2(total),
            avg_per_month: round2(total / period_count as f64),
        })
        .collect()
}
