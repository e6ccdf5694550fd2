//! Implements a struct that holds the state of the REST server.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use axum::extract::FromRef;

use crate::{Error, store::DocumentStore};

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The store holding every user's documents.
    pub store: Arc<DocumentStore>,

    /// The directory the web client is served from.
    pub client_dir: PathBuf,
}

impl AppState {
    /// Create a new [AppState] with the documents stored under `data_dir`.
    ///
    /// # Errors
    /// Returns an error if the data directory cannot be created.
    pub fn new(data_dir: impl AsRef<Path>, client_dir: impl AsRef<Path>) -> Result<Self, Error> {
        Ok(Self {
            store: Arc::new(DocumentStore::new(data_dir)?),
            client_dir: client_dir.as_ref().to_path_buf(),
        })
    }
}

/// The state needed by handlers that read or write user documents.
#[derive(Debug, Clone)]
pub struct DocumentState {
    /// The store holding every user's documents.
    pub store: Arc<DocumentStore>,
}

impl FromRef<AppState> for DocumentState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
        }
    }
}

/// The state needed to serve the web client.
#[derive(Debug, Clone)]
pub struct ClientState {
    /// The directory the web client is served from.
    pub client_dir: PathBuf,
}

impl FromRef<AppState> for ClientState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            client_dir: state.client_dir.clone(),
        }
    }
}
