//! User names and the extractor that identifies which user a request is for.
//!
//! There is no authentication: a user is just a sanitized directory name.
//! Every request names its user explicitly, either with the `X-User` header or
//! with the cookie set by the log-in endpoint.

use std::fmt::Display;

use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};

use crate::Error;

/// The header a client can use to select the user for a single request.
pub const USER_HEADER: &str = "x-user";
/// The cookie set at log-in that names the user.
pub const USER_COOKIE: &str = "mt_user";

/// A sanitized user name that is safe to use as a directory name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserName(String);

impl UserName {
    /// Create a user name from raw user input.
    ///
    /// Surrounding whitespace is trimmed and every character that is not an
    /// ASCII letter, digit, `_`, `-` or `.` is dropped.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidUser] if nothing is left after sanitizing, or if
    /// the result is `.` or `..`.
    pub fn new(raw: &str) -> Result<Self, Error> {
        let name: String = raw
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
            .collect();

        if name.is_empty() || name == "." || name == ".." {
            Err(Error::InvalidUser)
        } else {
            Ok(Self(name))
        }
    }

    /// Create a user name without sanitizing it.
    ///
    /// The caller should ensure that `name` is already a valid directory name.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl AsRef<str> for UserName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for UserName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The user a request acts on behalf of.
///
/// Handlers that need a user take `CurrentUser(user): CurrentUser`, which
/// rejects the request with [Error::NoActiveUser] if no user was named.
/// Handlers that can work without one take `Option<CurrentUser>`.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentUser(pub UserName);

/// Find the user named by the request, preferring the header over the cookie.
fn requested_user(parts: &Parts) -> Option<Result<UserName, Error>> {
    let from_header = parts
        .headers
        .get(USER_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned);

    let raw = from_header.or_else(|| {
        CookieJar::from_headers(&parts.headers)
            .get(USER_COOKIE)
            .map(|cookie| cookie.value().to_owned())
            .filter(|value| !value.is_empty())
    })?;

    Some(UserName::new(&raw))
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match requested_user(parts) {
            Some(user) => user.map(CurrentUser),
            None => Err(Error::NoActiveUser),
        }
    }
}

impl<S> OptionalFromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        requested_user(parts)
            .transpose()
            .map(|user| user.map(CurrentUser))
    }
}
