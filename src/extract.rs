//! A JSON body extractor that reports rejections as [Error].

use axum::{
    Json,
    body::Bytes,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde::de::DeserializeOwned;

use crate::Error;

/// A JSON request body.
///
/// Unlike [Json], the `Content-Type` header is not checked, so clients that
/// send JSON as `text/plain` (or with no content type) are still understood.
/// A body that cannot be read or parsed is rejected with the usual JSON error
/// body: 400 for malformed JSON, 422 for JSON of the wrong shape.
#[derive(Debug, Clone, Default)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(request, state)
            .await
            .map_err(|rejection| Error::InvalidJson {
                status: rejection.status(),
                message: rejection.body_text(),
            })?;

        let Json(value) = Json::<T>::from_bytes(&bytes)?;

        Ok(Self(value))
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::InvalidJson {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}
