//! Endpoints for reading and replacing a user's categories.

use axum::{Json, extract::State};
use serde_json::{Value, json};

use crate::{
    Error,
    app_state::DocumentState,
    extract::ApiJson,
    payload::{Payload, expect_object},
    store::{Categories, Collection},
    user::CurrentUser,
};

pub(crate) const CATEGORIES_SHAPE_ERROR: &str = "'categories' must be an object {name: [subs...]}";

/// Get the user's categories as `{category: [subcategory, ...]}`.
pub async fn get_categories(
    State(state): State<DocumentState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Categories>, Error> {
    state.store.ensure_user(&user)?;

    let categories = state.store.read::<Categories>(&user, Collection::Categories);
    tracing::debug!("loaded {} categories for {user}", categories.value.len());

    Ok(Json(categories.into_value()))
}

/// Replace the user's categories with `{"categories": {...}}`.
///
/// A body without `categories` clears them.
pub async fn update_categories(
    State(state): State<DocumentState>,
    CurrentUser(user): CurrentUser,
    ApiJson(payload): ApiJson<Payload>,
) -> Result<Json<Value>, Error> {
    let categories = match payload.get("categories") {
        Some(value) => expect_object(value, CATEGORIES_SHAPE_ERROR)?,
        None => Categories::new(),
    };

    state.store.ensure_user(&user)?;
    state
        .store
        .write(&user, Collection::Categories, &categories)
        .inspect_err(|error| tracing::error!("could not save categories for {user}: {error}"))?;

    Ok(Json(json!({ "ok": true })))
}

#[cfg(test)]
mod tests {
    use axum::{Json, extract::State};
    use serde_json::json;

    use crate::{
        Error,
        category::{CATEGORIES_SHAPE_ERROR, get_categories, update_categories},
        extract::ApiJson,
        test_utils::{get_test_state, test_user},
    };

    #[tokio::test]
    async fn new_user_has_no_categories() {
        let (_dir, state) = get_test_state();

        let Json(categories) = get_categories(State(state), test_user()).await.unwrap();

        assert!(categories.is_empty());
    }

    #[tokio::test]
    async fn can_replace_categories() {
        let (_dir, state) = get_test_state();
        let payload = serde_json::from_value(json!({
            "categories": {"Food": ["Groceries", "Dining"], "Rent": []}
        }))
        .unwrap();

        update_categories(State(state.clone()), test_user(), ApiJson(payload))
            .await
            .unwrap();

        let Json(categories) = get_categories(State(state), test_user()).await.unwrap();
        assert_eq!(
            serde_json::to_value(categories).unwrap(),
            json!({"Food": ["Groceries", "Dining"], "Rent": []})
        );
    }

    #[tokio::test]
    async fn keeps_category_order() {
        let (_dir, state) = get_test_state();
        let payload =
            serde_json::from_value(json!({"categories": {"Zoo": [], "Apples": []}})).unwrap();

        update_categories(State(state.clone()), test_user(), ApiJson(payload))
            .await
            .unwrap();

        let Json(categories) = get_categories(State(state), test_user()).await.unwrap();
        let names: Vec<_> = categories.keys().cloned().collect();
        assert_eq!(names, vec!["Zoo", "Apples"]);
    }

    #[tokio::test]
    async fn rejects_non_object_categories() {
        let (_dir, state) = get_test_state();
        let payload = serde_json::from_value(json!({"categories": ["Food"]})).unwrap();

        let result = update_categories(State(state.clone()), test_user(), ApiJson(payload)).await;

        assert_eq!(
            result.unwrap_err(),
            Error::InvalidPayload(CATEGORIES_SHAPE_ERROR.to_owned())
        );
        let Json(categories) = get_categories(State(state), test_user()).await.unwrap();
        assert!(categories.is_empty());
    }
}
