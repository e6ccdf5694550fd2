//! Defines the app level error type and its conversion to JSON error responses.
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The user name was empty after removing disallowed characters, or would
    /// escape the data directory (e.g., "..").
    #[error("Invalid user.")]
    InvalidUser,

    /// The request did not name a user via the `X-User` header or the
    /// session cookie.
    #[error("No active user. POST /api/login first.")]
    NoActiveUser,

    /// The request body had the wrong shape for the collection it targets,
    /// e.g., `categories` was not an object.
    ///
    /// The string is shown to the client as is.
    #[error("{0}")]
    InvalidPayload(String),

    /// The request body could not be read or was not JSON of the expected
    /// shape.
    ///
    /// The message is shown to the client as is.
    #[error("{message}")]
    InvalidJson {
        /// 400 for malformed JSON, 422 for the wrong shape, or whatever status
        /// reading the body failed with.
        status: StatusCode,
        /// What was wrong with the body.
        message: String,
    },

    /// The client bundle does not contain an `index.html`.
    #[error("client/index.html not found")]
    ClientMissing,

    /// The requested resource was not found.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Reading or writing a document on disk failed.
    ///
    /// The error string should only be logged on the server.
    #[error("could not access the document store: {0}")]
    StoreError(String),

    /// A stored document exists but could not be read, so a change that would
    /// write it back was refused to keep the file as it is.
    ///
    /// The string is the document's file name.
    #[error("{0} could not be read and was left unchanged, check the server logs")]
    UnreadableDocument(String),

    /// Could not acquire the document store's write lock.
    #[error("could not acquire the document store lock")]
    StoreLockError,

    /// An error occurred while serializing a document as JSON.
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// A timestamp could not be formatted.
    #[error("could not format date-time: {0}")]
    DateFormatError(String),
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        tracing::error!("an unhandled I/O error occurred: {}", value);
        Error::StoreError(value.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::JSONSerializationError(value.to_string())
    }
}

impl From<time::error::Format> for Error {
    fn from(value: time::error::Format) -> Self {
        Error::DateFormatError(value.to_string())
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidUser | Error::NoActiveUser | Error::InvalidPayload(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::InvalidJson { status, .. } => *status,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::ClientMissing
            | Error::UnreadableDocument(_)
            | Error::StoreError(_)
            | Error::StoreLockError
            | Error::JSONSerializationError(_)
            | Error::DateFormatError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match &self {
            Error::StoreError(_)
            | Error::StoreLockError
            | Error::JSONSerializationError(_)
            | Error::DateFormatError(_) => {
                // These are not intended to be shown to the client.
                tracing::error!("An unexpected error occurred: {}", self);
                "An unexpected error occurred, check the server logs for more details.".to_owned()
            }
            error => error.to_string(),
        };

        (status, Json(json!({ "ok": false, "error": message }))).into_response()
    }
}
