//! Application router configuration.

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderName, Method, header::CONTENT_TYPE},
    response::Html,
    routing::{get, post},
};
use serde_json::{Value, json};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
};

use crate::{
    AppState, Error,
    app_state::ClientState,
    category::{get_categories, update_categories},
    endpoints,
    history::{commit_transactions, get_history, replace_history},
    import::{clear_all, import_documents},
    session::{bootstrap, list_users, log_in, log_out},
    settings::{get_settings, update_settings},
    staging::{get_staged_transactions, replace_staged_transactions, reset_staged_transactions},
    stats::{
        get_category_last3, get_income_means, get_rollup, get_stats, get_summary, get_tag_means,
    },
    user::USER_HEADER,
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let client_files = ServeDir::new(&state.client_dir);

    let document_routes = Router::new()
        .route(endpoints::USERS, get(list_users))
        .route(endpoints::LOG_IN, post(log_in))
        .route(endpoints::LOG_OUT, post(log_out))
        .route(endpoints::BOOTSTRAP, get(bootstrap))
        .route(
            endpoints::CATEGORIES,
            get(get_categories).post(update_categories),
        )
        .route(
            endpoints::CURRENT_MONTH,
            get(get_staged_transactions).post(replace_staged_transactions),
        )
        .route(
            endpoints::CURRENT_MONTH_RESET,
            post(reset_staged_transactions),
        )
        .route(endpoints::PAST_DATA, get(get_history).post(replace_history))
        .route(endpoints::TRANSACTIONS, post(commit_transactions))
        .route(endpoints::SETTINGS, get(get_settings).post(update_settings))
        .route(endpoints::IMPORT, post(import_documents))
        .route(endpoints::CLEAR_ALL, post(clear_all));

    let stats_routes = Router::new()
        .route(endpoints::STATS, post(get_stats))
        .route(endpoints::STATS_SUMMARY, post(get_summary))
        .route(endpoints::STATS_TAG_MEANS, post(get_tag_means))
        .route(endpoints::STATS_CATEGORY_LAST3, post(get_category_last3))
        .route(endpoints::STATS_INCOME_MEANS, post(get_income_means))
        .route(endpoints::STATS_ROLLUP, post(get_rollup));

    Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::HEALTH, get(get_health))
        .merge(document_routes)
        .merge(stats_routes)
        .nest_service(endpoints::CLIENT, client_files)
        .fallback(get_404_not_found)
        .layer(cors_layer())
        .with_state(state)
}

/// Allow the web client to call the API from another origin with cookies.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_credentials(true)
        .allow_headers([CONTENT_TYPE, HeaderName::from_static(USER_HEADER)])
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
}

/// Serve the web client's `index.html`.
async fn get_index_page(State(state): State<ClientState>) -> Result<Html<String>, Error> {
    let path = state.client_dir.join("index.html");

    match tokio::fs::read_to_string(&path).await {
        Ok(page) => Ok(Html(page)),
        Err(error) => {
            tracing::error!("could not read {path:?}: {error}");
            Err(Error::ClientMissing)
        }
    }
}

/// Report that the server is up, with the current UTC time.
async fn get_health() -> Result<Json<Value>, Error> {
    let timestamp = OffsetDateTime::now_utc().format(&Rfc3339)?;

    Ok(Json(json!({ "ok": true, "ts": timestamp })))
}

async fn get_404_not_found() -> Error {
    Error::NotFound
}
