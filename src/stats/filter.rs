//! Narrows the history down to the records a unified statistics request
//! covers.

use crate::{
    record::{Period, TransactionRecord},
    stats::selection::Selection,
};

/// The criteria a record must meet to be included in the unified statistics.
#[derive(Debug, Clone, Copy)]
pub(super) struct RecordFilter<'a> {
    selection: &'a Selection,
    kind: &'a str,
    categories: &'a [String],
    subcategories: &'a [String],
}

impl<'a> RecordFilter<'a> {
    pub fn new(
        selection: &'a Selection,
        kind: &'a str,
        categories: &'a [String],
        subcategories: &'a [String],
    ) -> Self {
        Self {
            selection,
            kind,
            categories,
            subcategories,
        }
    }

    /// Whether exactly one category is selected, in which case subcategories
    /// filter the records and group the breakdown.
    pub fn drills_down(&self) -> bool {
        self.categories.len() == 1
    }

    /// The record's period if the record passes the filter.
    pub fn period_of(&self, record: &TransactionRecord) -> Option<Period> {
        let period = record.period()?;

        if !self.selection.contains(&period) || record.kind() != Some(self.kind) {
            return None;
        }

        if !self.categories.is_empty() && !listed(self.categories, record.category()) {
            return None;
        }

        // Subcategory names are not unique across categories, so they only
        // apply when a single category is selected.
        if self.drills_down()
            && !self.subcategories.is_empty()
            && !listed(self.subcategories, record.subcategory())
        {
            return None;
        }

        Some(period)
    }

    /// The matching records with their periods, in history order.
    pub fn apply<'r>(
        &self,
        history: &'r [TransactionRecord],
    ) -> Vec<(Period, &'r TransactionRecord)> {
        history
            .iter()
            .filter_map(|record| Some((self.period_of(record)?, record)))
            .collect()
    }
}

fn listed(names: &[String], name: Option<&str>) -> bool {
    name.is_some_and(|name| names.iter().any(|listed| listed == name))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{
        record::Period,
        stats::{filter::RecordFilter, selection::Selection},
        test_utils::records,
    };

    fn selection() -> Selection {
        Selection::explicit(
            &[2025],
            &serde_json::from_value(json!({"2025": [7, 8]})).unwrap(),
        )
    }

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn keeps_records_in_selected_periods_of_the_type() {
        let history = records(json!([
            {"id": 1, "date": "2025-07-01", "month_tag": 7, "type": "Expense"},
            {"id": 2, "date": "2025-09-01", "month_tag": 9, "type": "Expense"},
            {"id": 3, "date": "2025-08-01", "month_tag": 8, "type": "Income"},
            {"id": 4, "date": "2025-08-01", "type": "Expense"},
            {"id": 5, "date": "2025-08-02", "tag": "8", "type": "Expense"},
        ]));
        let selection = selection();
        let filter = RecordFilter::new(&selection, "Expense", &[], &[]);

        let matched = filter.apply(&history);

        let ids: Vec<_> = matched.iter().filter_map(|(_, record)| record.id()).collect();
        assert_eq!(ids, vec!["1", "5"]);
        assert_eq!(matched[1].0, Period::new(2025, 8));
    }

    #[test]
    fn filters_by_category_and_drills_into_subcategory() {
        let history = records(json!([
            {
                "id": 1, "date": "2025-07-01", "month_tag": 7, "type": "Expense",
                "category": "Food", "subcategory": "Dining"
            },
            {
                "id": 2, "date": "2025-07-01", "month_tag": 7, "type": "Expense",
                "category": "Food", "subcategory": "Groceries"
            },
            {"id": 3, "date": "2025-07-01", "month_tag": 7, "type": "Expense", "category": "Rent"},
            {"id": 4, "date": "2025-07-01", "month_tag": 7, "type": "Expense"},
        ]));
        let selection = selection();
        let categories = names(&["Food"]);
        let subcategories = names(&["Dining"]);
        let filter = RecordFilter::new(&selection, "Expense", &categories, &subcategories);

        let ids: Vec<_> = filter
            .apply(&history)
            .iter()
            .filter_map(|(_, record)| record.id())
            .collect();

        assert!(filter.drills_down());
        assert_eq!(ids, vec!["1"]);
    }

    #[test]
    fn subcategories_are_ignored_with_several_categories() {
        let history = records(json!([
            {
                "id": 1, "date": "2025-07-01", "month_tag": 7, "type": "Expense",
                "category": "Food", "subcategory": "Dining"
            },
            {
                "id": 2, "date": "2025-07-01", "month_tag": 7, "type": "Expense",
                "category": "Food", "subcategory": "Groceries"
            },
            {"id": 3, "date": "2025-08-01", "month_tag": 8, "type": "Expense", "category": "Rent"},
        ]));
        let selection = selection();
        let categories = names(&["Food", "Rent"]);
        let subcategories = names(&["Dining"]);

        let with_subcategories =
            RecordFilter::new(&selection, "Expense", &categories, &subcategories).apply(&history);
        let without_subcategories =
            RecordFilter::new(&selection, "Expense", &categories, &[]).apply(&history);

        assert_eq!(with_subcategories, without_subcategories);
        assert_eq!(with_subcategories.len(), 3);
    }
}
