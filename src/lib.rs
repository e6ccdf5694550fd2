//! MoneyTron is a personal finance tracker.
//!
//! This library provides the JSON API behind the MoneyTron web client. Each
//! user's categories, staged transactions, committed history and settings are
//! stored as JSON documents on disk, and the statistics endpoints summarize
//! the committed history over a selection of (year, month tag) periods.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod app_state;
mod category;
mod endpoints;
mod error;
mod extract;
mod history;
mod import;
mod logging;
mod payload;
mod record;
mod routing;
mod session;
mod settings;
mod staging;
pub mod stats;
mod store;
mod user;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use error::Error;
pub use extract::ApiJson;
pub use history::{MergeSummary, merge_into_history};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use record::{Period, TransactionRecord};
pub use routing::build_router;
pub use settings::Settings;
pub use store::{Collection, Document, DocumentSource, DocumentStore};
pub use user::{CurrentUser, UserName};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to install terminate signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}
