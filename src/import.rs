//! Bulk import of a user's documents and the endpoint that wipes them.

use axum::{Json, extract::State};
use serde_json::{Value, json};

use crate::{
    Error,
    app_state::DocumentState,
    category::CATEGORIES_SHAPE_ERROR,
    extract::ApiJson,
    payload::{Payload, expect_object, expect_records},
    settings::{Settings, parse_settings_update},
    store::{Categories, Collection, DocumentStore, Transactions},
    user::{CurrentUser, UserName},
};

/// The documents found in an import request, already shape checked.
#[derive(Debug)]
struct ImportBundle {
    categories: Option<Categories>,
    staged: Option<Transactions>,
    history: Option<Transactions>,
    settings: Option<Settings>,
}

impl ImportBundle {
    /// Check every document in `payload` before anything is written, so a bad
    /// document rejects the whole import.
    fn parse(payload: &Payload) -> Result<Self, Error> {
        let categories = payload
            .get("categories")
            .map(|value| expect_object(value, CATEGORIES_SHAPE_ERROR))
            .transpose()?;
        let staged = payload
            .get("current_month")
            .map(|value| expect_records(value, "'current_month' must be a list"))
            .transpose()?;
        let history = payload
            .get("past_data")
            .map(|value| expect_records(value, "'past_data' must be a list"))
            .transpose()?;
        let settings = match payload.get("settings") {
            Some(_) => Some(Settings::default().merge(parse_settings_update(payload)?)),
            None => None,
        };

        Ok(Self {
            categories,
            staged,
            history,
            settings,
        })
    }

    fn write(&self, store: &DocumentStore, user: &UserName) -> Result<(), Error> {
        if let Some(categories) = &self.categories {
            store.write(user, Collection::Categories, categories)?;
        }
        if let Some(staged) = &self.staged {
            store.write(user, Collection::Stage, staged)?;
        }
        if let Some(history) = &self.history {
            store.write(user, Collection::Past, history)?;
        }
        if let Some(settings) = &self.settings {
            store.write(user, Collection::Settings, settings)?;
        }

        Ok(())
    }
}

/// Replace any of `categories`, `current_month`, `past_data` and `settings`
/// with the documents in the request body.
///
/// Imported settings start from the defaults rather than the stored settings.
pub async fn import_documents(
    State(state): State<DocumentState>,
    CurrentUser(user): CurrentUser,
    ApiJson(payload): ApiJson<Payload>,
) -> Result<Json<Value>, Error> {
    let bundle = ImportBundle::parse(&payload)?;
    state.store.ensure_user(&user)?;

    bundle
        .write(&state.store, &user)
        .inspect_err(|error| tracing::error!("import for {user} failed: {error}"))?;

    tracing::info!("imported documents for {user}");

    Ok(Json(json!({ "ok": true })))
}

/// Empty the categories, staging area and history. Settings are kept.
pub async fn clear_all(
    State(state): State<DocumentState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Value>, Error> {
    state.store.ensure_user(&user)?;

    let store = &state.store;
    store
        .write(&user, Collection::Categories, &Categories::new())
        .and_then(|_| store.write(&user, Collection::Stage, &Transactions::new()))
        .and_then(|_| store.write(&user, Collection::Past, &Transactions::new()))
        .inspect_err(|error| tracing::error!("could not clear documents for {user}: {error}"))?;

    tracing::info!("cleared all documents for {user}");

    Ok(Json(json!({ "ok": true })))
}

#[cfg(test)]
mod tests {
    use axum::extract::State;
    use serde_json::json;

    use crate::{
        Error,
        extract::ApiJson,
        import::{clear_all, import_documents},
        settings::Settings,
        store::{Categories, Collection, Transactions},
        test_utils::{get_test_state, records, test_user},
    };

    #[tokio::test]
    async fn imports_every_document() {
        let (_dir, state) = get_test_state();
        let payload = serde_json::from_value(json!({
            "categories": {"Food": ["Dining"]},
            "current_month": [{"id": 1}],
            "past_data": [{"id": 2}, {"id": 3}],
            "settings": {"currency": "USD"},
        }))
        .unwrap();

        import_documents(State(state.clone()), test_user(), ApiJson(payload))
            .await
            .unwrap();

        let user = test_user().0;
        assert_eq!(
            state.store.read_records(&user, Collection::Stage).value,
            records(json!([{"id": 1}]))
        );
        assert_eq!(
            state.store.read_records(&user, Collection::Past).value,
            records(json!([{"id": 2}, {"id": 3}]))
        );
        let settings = state.store.read::<Settings>(&user, Collection::Settings).value;
        assert_eq!(settings.currency, "USD");
        assert_eq!(settings.date_format, "YYYY-MM-DD");
    }

    #[tokio::test]
    async fn bad_document_rejects_whole_import() {
        let (_dir, state) = get_test_state();
        let payload = serde_json::from_value(json!({
            "categories": {"Food": []},
            "past_data": {"not": "a list"},
        }))
        .unwrap();

        let result = import_documents(State(state.clone()), test_user(), ApiJson(payload)).await;

        assert_eq!(
            result.unwrap_err(),
            Error::InvalidPayload("'past_data' must be a list".to_owned())
        );
        let categories = state
            .store
            .read::<Categories>(&test_user().0, Collection::Categories)
            .value;
        assert!(categories.is_empty());
    }

    #[tokio::test]
    async fn absent_documents_are_left_alone() {
        let (_dir, state) = get_test_state();
        let first = serde_json::from_value(json!({"past_data": [{"id": 1}]})).unwrap();
        import_documents(State(state.clone()), test_user(), ApiJson(first))
            .await
            .unwrap();

        let second = serde_json::from_value(json!({"categories": {}})).unwrap();
        import_documents(State(state.clone()), test_user(), ApiJson(second))
            .await
            .unwrap();

        assert_eq!(
            state
                .store
                .read_records(&test_user().0, Collection::Past)
                .value
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn clear_all_keeps_settings() {
        let (_dir, state) = get_test_state();
        let payload = serde_json::from_value(json!({
            "categories": {"Food": []},
            "current_month": [{"id": 1}],
            "past_data": [{"id": 2}],
            "settings": {"currency": "USD"},
        }))
        .unwrap();
        import_documents(State(state.clone()), test_user(), ApiJson(payload))
            .await
            .unwrap();

        clear_all(State(state.clone()), test_user()).await.unwrap();

        let user = test_user().0;
        assert!(state.store.read::<Categories>(&user, Collection::Categories).value.is_empty());
        assert!(state.store.read_records(&user, Collection::Stage).value.is_empty());
        assert!(state.store.read_records(&user, Collection::Past).value.is_empty());
        assert_eq!(
            state.store.read::<Settings>(&user, Collection::Settings).value.currency,
            "USD"
        );
    }
}
