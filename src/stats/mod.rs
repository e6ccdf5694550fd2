//! Statistics over a user's committed history.
//!
//! The unified endpoint resolves a set of (year, tag) periods, filters the
//! history down to matching records and reduces them into per-period totals,
//! a summary and a top-N breakdown. The legacy endpoints are narrower
//! reducers with their own independent filters.

mod aggregation;
mod filter;
mod handlers;
mod legacy;
mod selection;

pub use aggregation::{
    CategoryTotal, MIN_PERIODS, PeriodTotal, SelectionView, StatsRequest, StatsResponse, Summary,
    compute_stats,
};
pub use handlers::{
    get_category_last3, get_income_means, get_rollup, get_stats, get_summary, get_tag_means,
};
pub use legacy::{
    CategoryLast3, CategoryRequest, IncomeGroup, IncomeMeans, LegacyFilter, LegacySummary, Rollup,
    RollupRow, TagMean, TagMeans,
};
pub use selection::{QuickFilter, Selection};

/// Round to two decimal places, halfway cases away from zero.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// A running total and count of amounts.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct Tally {
    pub total: f64,
    pub count: usize,
}

impl Tally {
    pub fn add(&mut self, amount: f64) {
        self.total += amount;
        self.count += 1;
    }

    /// The mean of the amounts added so far, zero if there are none.
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total / self.count as f64
        }
    }
}
