//! The committed transaction history and the commit operation that moves
//! staged transactions into it.

use std::collections::HashSet;

use axum::{Json, extract::State};
use serde::Serialize;
use serde_json::{Value, json};

use crate::{
    Error,
    app_state::DocumentState,
    extract::ApiJson,
    payload::{Payload, expect_records, first_present},
    record::TransactionRecord,
    store::{Collection, Transactions},
    user::CurrentUser,
};

pub(crate) const HISTORY_SHAPE_ERROR: &str = "'past_data' must be a list";
const COMMIT_SHAPE_ERROR: &str = "'transactions' must be a list";

/// The outcome of merging records into the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MergeSummary {
    /// The number of records appended to the history.
    pub saved: usize,
    /// The number of records skipped because their ID was already in the history.
    pub skipped: usize,
    /// The length of the history after merging.
    pub total: usize,
}

/// Append `incoming` to `history`, skipping records whose ID is already
/// present.
///
/// Records already in the history are never overwritten. Records without an
/// ID are always appended. Merging the same records twice leaves the history
/// unchanged the second time, as long as they have IDs.
pub fn merge_into_history(
    history: &mut Vec<TransactionRecord>,
    incoming: Vec<TransactionRecord>,
) -> MergeSummary {
    let mut seen: HashSet<String> = history.iter().filter_map(TransactionRecord::id).collect();
    let mut saved = 0;
    let mut skipped = 0;

    for record in incoming {
        if let Some(id) = record.id() {
            if !seen.insert(id) {
                skipped += 1;
                continue;
            }
        }

        history.push(record);
        saved += 1;
    }

    MergeSummary {
        saved,
        skipped,
        total: history.len(),
    }
}

/// Get the committed history as `{"past_data": [...]}`.
pub async fn get_history(
    State(state): State<DocumentState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Value>, Error> {
    state.store.ensure_user(&user)?;
    let history = state.store.read_records(&user, Collection::Past);

    Ok(Json(json!({ "past_data": history.into_value() })))
}

/// Overwrite the whole history with the list in `past_data` (or `items`).
pub async fn replace_history(
    State(state): State<DocumentState>,
    CurrentUser(user): CurrentUser,
    ApiJson(payload): ApiJson<Payload>,
) -> Result<Json<Value>, Error> {
    let history = match first_present(&payload, &["past_data", "items"]) {
        Some(value) => expect_records(value, HISTORY_SHAPE_ERROR)?,
        None => Transactions::new(),
    };

    state.store.ensure_user(&user)?;
    state
        .store
        .write(&user, Collection::Past, &history)
        .inspect_err(|error| tracing::error!("could not save history for {user}: {error}"))?;

    Ok(Json(json!({ "ok": true })))
}

/// Commit transactions to the history and clear the staging area.
///
/// The records come from `transactions` in the request body, or from the
/// staging area if the body has none. Nothing is written if the stored
/// history (or the staging area it commits from) cannot be read.
pub async fn commit_transactions(
    State(state): State<DocumentState>,
    CurrentUser(user): CurrentUser,
    ApiJson(payload): ApiJson<Payload>,
) -> Result<Json<Value>, Error> {
    let incoming = match payload.get("transactions") {
        Some(Value::Null) | None => None,
        Some(value) => Some(expect_records(value, COMMIT_SHAPE_ERROR)?),
    };

    state.store.ensure_user(&user)?;

    let incoming = match incoming {
        Some(records) => records,
        None => state
            .store
            .read_records(&user, Collection::Stage)
            .into_writable(Collection::Stage)?,
    };

    let mut history = state
        .store
        .read_records(&user, Collection::Past)
        .into_writable(Collection::Past)?;

    let summary = merge_into_history(&mut history, incoming);

    state
        .store
        .write(&user, Collection::Past, &history)
        .inspect_err(|error| tracing::error!("could not save history for {user}: {error}"))?;
    state
        .store
        .write(&user, Collection::Stage, &Transactions::new())
        .inspect_err(|error| tracing::error!("could not clear staging for {user}: {error}"))?;

    tracing::info!(
        "committed {} transactions for {user} ({} duplicates skipped)",
        summary.saved,
        summary.skipped
    );

    Ok(Json(json!({
        "ok": true,
        "saved": summary.saved,
        "skipped": summary.skipped,
        "total": summary.total,
    })))
}


#[cfg(test)]
mod commit_endpoint_tests {
    use std::fs;

    use axum::{Json, extract::State};
    use serde_json::json;

    use crate::{
        Error,
        extract::ApiJson,
        history::{HISTORY_SHAPE_ERROR, commit_transactions, get_history, replace_history},
        payload::Payload,
        staging::{get_staged_transactions, replace_staged_transactions},
        store::Collection,
        test_utils::{get_test_state, test_user},
    };

    #[tokio::test]
    async fn commit_appends_and_clears_staging() {
        let (_dir, state) = get_test_state();
        let staged = serde_json::from_value(json!({"transactions": [{"id": 1}]})).unwrap();
        replace_staged_transactions(State(state.clone()), test_user(), ApiJson(staged))
            .await
            .unwrap();
        let payload =
            serde_json::from_value(json!({"transactions": [{"id": 1}, {"id": 2}]})).unwrap();

        let Json(body) = commit_transactions(State(state.clone()), test_user(), ApiJson(payload))
            .await
            .unwrap();

        assert_eq!(body, json!({"ok": true, "saved": 2, "skipped": 0, "total": 2}));
        let Json(staged) = get_staged_transactions(State(state.clone()), test_user())
            .await
            .unwrap();
        assert_eq!(staged, json!({"current_month": []}));
    }

    #[tokio::test]
    async fn committing_same_record_twice_keeps_one_copy() {
        let (_dir, state) = get_test_state();
        let payload = || {
            serde_json::from_value::<Payload>(json!({"transactions": [{"id": "x"}]})).unwrap()
        };

        commit_transactions(State(state.clone()), test_user(), ApiJson(payload()))
            .await
            .unwrap();
        commit_transactions(State(state.clone()), test_user(), ApiJson(payload()))
            .await
            .unwrap();

        let Json(history) = get_history(State(state), test_user()).await.unwrap();
        assert_eq!(history, json!({"past_data": [{"id": "x"}]}));
    }

    #[tokio::test]
    async fn commit_without_body_uses_staging() {
        let (_dir, state) = get_test_state();
        let staged = serde_json::from_value(json!({"transactions": [{"id": 9}]})).unwrap();
        replace_staged_transactions(State(state.clone()), test_user(), ApiJson(staged))
            .await
            .unwrap();

        commit_transactions(State(state.clone()), test_user(), ApiJson(Default::default()))
            .await
            .unwrap();

        let Json(history) = get_history(State(state), test_user()).await.unwrap();
        assert_eq!(history, json!({"past_data": [{"id": 9}]}));
    }

    #[tokio::test]
    async fn commit_keeps_history_around_items_that_are_not_records() {
        let (_dir, state) = get_test_state();
        let user = test_user().0;
        state.store.ensure_user(&user).unwrap();
        fs::write(
            state.store.path(&user, Collection::Past),
            r#"[{"id": "a", "debit": 100}, {"id": "b", "debit": 300}, "stray note"]"#,
        )
        .unwrap();
        let payload = serde_json::from_value(json!({"transactions": [{"id": "c", "debit": 5}]}))
            .unwrap();

        let Json(body) = commit_transactions(State(state.clone()), test_user(), ApiJson(payload))
            .await
            .unwrap();

        assert_eq!(body["total"], 3);
        let Json(history) = get_history(State(state), test_user()).await.unwrap();
        assert_eq!(
            history,
            json!({"past_data": [
                {"id": "a", "debit": 100},
                {"id": "b", "debit": 300},
                {"id": "c", "debit": 5},
            ]})
        );
    }

    #[tokio::test]
    async fn commit_refuses_to_overwrite_unreadable_history() {
        let (_dir, state) = get_test_state();
        let user = test_user().0;
        state.store.ensure_user(&user).unwrap();
        let path = state.store.path(&user, Collection::Past);
        fs::write(&path, "[{\"id\": \"a\"}, {oops").unwrap();
        let staged = serde_json::from_value(json!({"transactions": [{"id": "c"}]})).unwrap();
        replace_staged_transactions(State(state.clone()), test_user(), ApiJson(staged))
            .await
            .unwrap();

        let result =
            commit_transactions(State(state.clone()), test_user(), ApiJson(Default::default()))
                .await;

        assert_eq!(
            result.unwrap_err(),
            Error::UnreadableDocument("past_data.json".to_owned())
        );
        assert_eq!(fs::read_to_string(&path).unwrap(), "[{\"id\": \"a\"}, {oops");
        let Json(staged) = get_staged_transactions(State(state), test_user())
            .await
            .unwrap();
        assert_eq!(staged, json!({"current_month": [{"id": "c"}]}));
    }

    #[tokio::test]
    async fn replace_history_rejects_non_list() {
        let (_dir, state) = get_test_state();
        let payload = serde_json::from_value(json!({"past_data": {"id": 1}})).unwrap();

        let result = replace_history(State(state), test_user(), ApiJson(payload)).await;

        assert_eq!(
            result.unwrap_err(),
            Error::InvalidPayload(HISTORY_SHAPE_ERROR.to_owned())
        );
    }
}
