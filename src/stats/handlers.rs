//! HTTP handlers for the statistics endpoints.
//!
//! Every handler reads the user's history once and leaves the store
//! untouched.

use axum::{Json, extract::State};

use crate::{
    Error,
    app_state::DocumentState,
    extract::ApiJson,
    stats::{
        aggregation::{StatsRequest, StatsResponse, compute_stats},
        legacy::{
            self, CategoryLast3, CategoryRequest, IncomeMeans, LegacyFilter, LegacySummary,
            Rollup, TagMeans,
        },
    },
    store::{Collection, Transactions},
    user::{CurrentUser, UserName},
};

fn load_history(state: &DocumentState, user: &UserName) -> Transactions {
    let history = state.store.read_records(user, Collection::Past);

    if history.is_default() {
        tracing::debug!("no stored history for {user}: {:?}", history.source);
    }

    history.into_value()
}

/// Compute the unified statistics over the user's history.
pub async fn get_stats(
    State(state): State<DocumentState>,
    CurrentUser(user): CurrentUser,
    ApiJson(request): ApiJson<StatsRequest>,
) -> Json<StatsResponse> {
    let history = load_history(&state, &user);

    Json(compute_stats(&request, &history))
}

/// Mean, extremes and count of the matching debits.
pub async fn get_summary(
    State(state): State<DocumentState>,
    CurrentUser(user): CurrentUser,
    ApiJson(filter): ApiJson<LegacyFilter>,
) -> Json<LegacySummary> {
    let history = load_history(&state, &user);

    Json(legacy::summary(&filter, &history))
}

/// Mean debit per tag, with years merged.
pub async fn get_tag_means(
    State(state): State<DocumentState>,
    CurrentUser(user): CurrentUser,
    ApiJson(filter): ApiJson<LegacyFilter>,
) -> Json<TagMeans> {
    let history = load_history(&state, &user);

    Json(legacy::tag_means_by_tag(&filter, &history))
}

/// Mean debit of one category in its three highest tags.
pub async fn get_category_last3(
    State(state): State<DocumentState>,
    CurrentUser(user): CurrentUser,
    ApiJson(request): ApiJson<CategoryRequest>,
) -> Result<Json<CategoryLast3>, Error> {
    let history = load_history(&state, &user);

    legacy::category_last3(&request, &history).map(Json)
}

/// Mean income per (category, subcategory).
pub async fn get_income_means(
    State(state): State<DocumentState>,
    CurrentUser(user): CurrentUser,
    ApiJson(filter): ApiJson<LegacyFilter>,
) -> Json<IncomeMeans> {
    let history = load_history(&state, &user);

    Json(legacy::income_means(&filter, &history))
}

/// Total, mean and count per (year, tag).
pub async fn get_rollup(
    State(state): State<DocumentState>,
    CurrentUser(user): CurrentUser,
    ApiJson(filter): ApiJson<LegacyFilter>,
) -> Json<Rollup> {
    let history = load_history(&state, &user);

    Json(legacy::rollup(&filter, &history))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use axum::{Json, extract::State};
    use serde_json::json;

    use crate::{
        extract::ApiJson,
        stats::{
            aggregation::StatsRequest,
            handlers::{get_stats, get_summary},
            legacy::LegacyFilter,
        },
        store::Collection,
        test_utils::{get_test_state, records, test_user},
    };

    #[tokio::test]
    async fn stats_read_the_stored_history() {
        let (_dir, state) = get_test_state();
        let history = records(json!([
            {
                "date": "2025-07-01", "month_tag": 7, "type": "Expense", "category": "Food",
                "debit": 100
            },
            {
                "date": "2025-08-01", "month_tag": 8, "type": "Expense", "category": "Food",
                "debit": 300
            },
        ]));
        state
            .store
            .write(&test_user().0, Collection::Past, &history)
            .unwrap();
        let request: StatsRequest = serde_json::from_value(json!({
            "years": [2025],
            "tagsByYear": {"2025": [7, 8]},
            "type": "Expense",
        }))
        .unwrap();

        let Json(response) = get_stats(State(state), test_user(), ApiJson(request)).await;

        assert_eq!(response.summary.total_over_period, 400.0);
    }

    #[tokio::test]
    async fn stats_skip_history_items_that_are_not_records() {
        let (_dir, state) = get_test_state();
        let user = test_user().0;
        state.store.ensure_user(&user).unwrap();
        fs::write(
            state.store.path(&user, Collection::Past),
            json!([
                {"date": "2025-07-01", "month_tag": 7, "type": "Expense", "debit": 100},
                {"date": "2025-08-01", "month_tag": 8, "type": "Expense", "debit": 300},
                "stray note",
            ])
            .to_string(),
        )
        .unwrap();
        let request: StatsRequest = serde_json::from_value(json!({
            "years": [2025],
            "tagsByYear": {"2025": [7, 8]},
            "type": "Expense",
        }))
        .unwrap();

        let Json(response) = get_stats(State(state), test_user(), ApiJson(request)).await;

        assert_eq!(response.summary.total_over_period, 400.0);
    }

    #[tokio::test]
    async fn stats_do_not_create_documents() {
        let (_dir, state) = get_test_state();
        let filter: LegacyFilter = serde_json::from_value(json!({})).unwrap();

        let Json(summary) = get_summary(State(state.clone()), test_user(), ApiJson(filter)).await;

        assert_eq!(summary.count, 0);
        assert!(!state.store.path(&test_user().0, Collection::Past).exists());
    }
}
