//! Endpoints for the staging area, the transactions entered for the current
//! month that have not been committed to the history yet.

use axum::{Json, extract::State};
use serde_json::{Value, json};

use crate::{
    Error,
    app_state::DocumentState,
    extract::ApiJson,
    payload::{Payload, expect_records, first_present},
    store::{Collection, Transactions},
    user::CurrentUser,
};

pub(crate) const STAGED_SHAPE_ERROR: &str = "'transactions' must be a list";

/// Get the staged transactions as `{"current_month": [...]}`.
pub async fn get_staged_transactions(
    State(state): State<DocumentState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Value>, Error> {
    state.store.ensure_user(&user)?;
    let staged = state.store.read_records(&user, Collection::Stage);

    Ok(Json(json!({ "current_month": staged.into_value() })))
}

/// Replace the staged transactions with the list in `transactions` (or `items`).
pub async fn replace_staged_transactions(
    State(state): State<DocumentState>,
    CurrentUser(user): CurrentUser,
    ApiJson(payload): ApiJson<Payload>,
) -> Result<Json<Value>, Error> {
    let staged = match first_present(&payload, &["transactions", "items"]) {
        Some(value) => expect_records(value, STAGED_SHAPE_ERROR)?,
        None => Transactions::new(),
    };

    state.store.ensure_user(&user)?;
    state
        .store
        .write(&user, Collection::Stage, &staged)
        .inspect_err(|error| {
            tracing::error!("could not save staged transactions for {user}: {error}")
        })?;

    Ok(Json(json!({ "ok": true })))
}

/// Discard every staged transaction.
pub async fn reset_staged_transactions(
    State(state): State<DocumentState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Value>, Error> {
    state.store.ensure_user(&user)?;
    state
        .store
        .write(&user, Collection::Stage, &Transactions::new())
        .inspect_err(|error| {
            tracing::error!("could not reset staged transactions for {user}: {error}")
        })?;

    Ok(Json(json!({ "ok": true })))
}
