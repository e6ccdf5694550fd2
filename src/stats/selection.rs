//! Resolves a statistics request into the set of periods it covers.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::record::{Period, TransactionRecord, int_like};

/// A selector that derives the periods from the history instead of an
/// explicit list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuickFilter {
    /// Use the explicit `years` and `tagsByYear`.
    #[default]
    None,
    /// The three most recent periods with any records.
    Last3,
    /// The six most recent periods with any records.
    Last6,
    /// Every period with any records.
    AllTime,
}

impl QuickFilter {
    /// How many of the most recent periods to keep, `None` for all of them.
    fn limit(self) -> Option<usize> {
        match self {
            QuickFilter::Last3 => Some(3),
            QuickFilter::Last6 => Some(6),
            QuickFilter::None | QuickFilter::AllTime => None,
        }
    }
}

/// A deduplicated set of periods, ordered by (year, tag).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    periods: BTreeSet<Period>,
}

impl Selection {
    /// Select every (year, tag) where the year is in `years` and the tag is
    /// listed under that year in `tags_by_year`.
    ///
    /// Keys of `tags_by_year` are year strings. Keys and tags that are not
    /// integer-like are ignored, as are years missing from either input.
    pub fn explicit(years: &[i64], tags_by_year: &Map<String, Value>) -> Self {
        let periods = tags_by_year
            .iter()
            .filter_map(|(year, tags)| {
                let year = year.trim().parse::<i64>().ok()?;
                years.contains(&year).then_some((year, tags))
            })
            .flat_map(|(year, tags)| {
                tags.as_array()
                    .into_iter()
                    .flatten()
                    .filter_map(int_like)
                    .map(move |tag| Period::new(year, tag))
            })
            .collect();

        Self { periods }
    }

    /// Select the most recent periods that have at least one record.
    ///
    /// [QuickFilter::None] selects nothing, use [Selection::explicit] for it.
    pub fn recent(filter: QuickFilter, history: &[TransactionRecord]) -> Self {
        if filter == QuickFilter::None {
            return Self::default();
        }

        let available: BTreeSet<Period> = history
            .iter()
            .filter_map(TransactionRecord::period)
            .collect();
        let newest_first = available.into_iter().rev();

        let periods = match filter.limit() {
            Some(limit) => newest_first.take(limit).collect(),
            None => newest_first.collect(),
        };

        Self { periods }
    }

    /// Resolve the selection for a request, using the quick filter if one is
    /// set and the explicit lists otherwise.
    pub fn resolve(
        quick_filter: QuickFilter,
        years: &[i64],
        tags_by_year: &Map<String, Value>,
        history: &[TransactionRecord],
    ) -> Self {
        match quick_filter {
            QuickFilter::None => Self::explicit(years, tags_by_year),
            filter => Self::recent(filter, history),
        }
    }

    /// The number of selected periods.
    pub fn len(&self) -> usize {
        self.periods.len()
    }

    /// Whether no periods are selected.
    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// Whether `period` is selected.
    pub fn contains(&self, period: &Period) -> bool {
        self.periods.contains(period)
    }

    /// The selected periods in ascending (year, tag) order.
    pub fn periods(&self) -> impl Iterator<Item = Period> + '_ {
        self.periods.iter().copied()
    }

    /// The distinct selected years, ascending.
    pub fn years(&self) -> Vec<i64> {
        let years: BTreeSet<i64> = self.periods.iter().map(|period| period.year).collect();

        years.into_iter().collect()
    }

    /// The selected tags grouped by year, keyed by the year as a string.
    pub fn tags_by_year(&self) -> BTreeMap<String, Vec<i64>> {
        let mut tags_by_year: BTreeMap<String, Vec<i64>> = BTreeMap::new();

        for period in &self.periods {
            tags_by_year
                .entry(period.year.to_string())
                .or_default()
                .push(period.tag);
        }

        tags_by_year
    }
}
