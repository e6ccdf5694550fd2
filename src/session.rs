//! Log-in by name, log-out and the bootstrap endpoint the client calls on
//! start-up.
//!
//! Logging in does not authenticate anyone. It sanitizes the name, creates the
//! user's documents and remembers the name in a cookie so later requests from
//! the browser are for that user.

use axum::{Json, extract::State};
use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use serde_json::{Value, json};
use time::{Duration, OffsetDateTime};

use crate::{
    Error,
    app_state::DocumentState,
    extract::ApiJson,
    payload::Payload,
    settings::Settings,
    store::{Categories, Collection, Transactions},
    user::{CurrentUser, USER_COOKIE, UserName},
};

/// The keys a log-in request may use for the user name, in order of preference.
const USER_NAME_KEYS: [&str; 3] = ["user", "username", "name"];

fn user_cookie(user: &UserName) -> Cookie<'static> {
    Cookie::build((USER_COOKIE, user.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// List every user that has documents, sorted by name.
pub async fn list_users(State(state): State<DocumentState>) -> Result<Json<Vec<String>>, Error> {
    let users = state
        .store
        .list_users()
        .inspect_err(|error| tracing::error!("could not list users: {error}"))?;

    Ok(Json(users))
}

/// Log in as the user named by `user`, `username` or `name`.
///
/// The user's documents are created if they do not exist yet and the name is
/// stored in the `mt_user` cookie.
pub async fn log_in(
    State(state): State<DocumentState>,
    jar: CookieJar,
    ApiJson(payload): ApiJson<Payload>,
) -> Result<(CookieJar, Json<Value>), Error> {
    let raw = USER_NAME_KEYS
        .iter()
        .filter_map(|key| payload.get(*key).and_then(Value::as_str))
        .find(|name| !name.is_empty())
        .unwrap_or_default();
    let user = UserName::new(raw)?;

    state
        .store
        .ensure_user(&user)
        .inspect_err(|error| tracing::error!("could not create documents for {user}: {error}"))?;

    tracing::info!("{user} logged in");

    Ok((
        jar.add(user_cookie(&user)),
        Json(json!({ "ok": true, "user": user })),
    ))
}

/// Forget the user stored in the cookie.
pub async fn log_out(jar: CookieJar) -> (CookieJar, Json<Value>) {
    let expired = Cookie::build((USER_COOKIE, ""))
        .path("/")
        .expires(OffsetDateTime::UNIX_EPOCH)
        .max_age(Duration::ZERO)
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();

    (jar.add(expired), Json(json!({ "ok": true })))
}

/// Get everything the client needs to render, or `{"user": ""}` if no user
/// was named.
pub async fn bootstrap(
    State(state): State<DocumentState>,
    user: Option<CurrentUser>,
) -> Result<Json<Value>, Error> {
    let Some(CurrentUser(user)) = user else {
        return Ok(Json(json!({ "user": "" })));
    };

    state.store.ensure_user(&user)?;

    let store = &state.store;
    Ok(Json(json!({
        "user": user,
        "categories": store.read::<Categories>(&user, Collection::Categories).into_value(),
        "current_month": store.read_records(&user, Collection::Stage).into_value(),
        "past_data": store.read_records(&user, Collection::Past).into_value(),
        "settings": store.read::<Settings>(&user, Collection::Settings).into_value(),
    })))
}
