//! API client utilities.
use std::{collections::BTreeMap, fmt::Display};

use reqwest::{Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use tracing::{trace, warn};

/// Error message found in the `error` field of an error body.
///
/// Most endpoints return a plain string, but some report one message
/// per offending parameter.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum ErrorMessage {
    /// A single human-readable message.
    Text(String),
    /// Messages keyed by parameter name.
    Fields(BTreeMap<String, String>),
}

impl Display for ErrorMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorMessage::Text(text) => write!(f, "{text}"),
            ErrorMessage::Fields(fields) => {
                let mut first = true;

                for (field, msg) in fields {
                    if !first {
                        write!(f, "; ")?;
                    }
                    write!(f, "{field}: {msg}")?;
                    first = false;
                }

                Ok(())
            }
        }
    }
}

/// A JSON error body returned by the API on errors.
#[derive(Debug, Deserialize)]
pub struct JsonErrorBody {
    /// Error message.
    pub error: ErrorMessage,
}

/// Rough classification of an upstream error, derived from the HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// `304`: the folder listing hasn't changed since the given hash.
    NotModified,
    /// `400`: bad input parameter.
    BadInput,
    /// `401`: missing, expired or revoked token.
    BadCredentials,
    /// `403`: bad OAuth request or operation not permitted.
    Forbidden,
    /// `404`: file or folder not found.
    NotFound,
    /// `406`: too many files would be involved in the operation.
    TooManyEntries,
    /// `411`: chunked transfer encoding isn't accepted.
    LengthRequired,
    /// `429` or `503`: rate limited.
    RateLimited,
    /// `507`: the user is over their storage quota.
    InsufficientStorage,
    /// Anything else, typically a `5xx`.
    Other,
}

impl From<u16> for ApiErrorKind {
    fn from(status: u16) -> Self {
        match status {
            304 => Self::NotModified,
            400 => Self::BadInput,
            401 => Self::BadCredentials,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            406 => Self::TooManyEntries,
            411 => Self::LengthRequired,
            429 | 503 => Self::RateLimited,
            507 => Self::InsufficientStorage,
            _ => Self::Other,
        }
    }
}

/// An error reported by Dropbox itself.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} (status {status})")]
pub struct ApiError {
    /// HTTP status code.
    pub status: u16,
    /// Error message, taken from the body if it could be parsed.
    pub message: String,
}

impl ApiError {
    /// Classify the error.
    #[must_use]
    pub fn kind(&self) -> ApiErrorKind {
        self.status.into()
    }

    /// Build an error from a failed response's status and raw body.
    ///
    /// ```
    /// use dropbox::api::{ApiError, ApiErrorKind};
    ///
    /// let err = ApiError::from_body(404, br#"{"error": "Path '/x' not found"}"#);
    /// assert_eq!(err.message, "Path '/x' not found");
    /// assert_eq!(err.kind(), ApiErrorKind::NotFound);
    ///
    /// let err = ApiError::from_body(502, b"<html>Bad Gateway</html>");
    /// assert_eq!(err.message, "<html>Bad Gateway</html>");
    /// ```
    #[must_use]
    pub fn from_body(status: u16, body: &[u8]) -> Self {
        let message = match serde_json::from_slice::<JsonErrorBody>(body) {
            Ok(body) => body.error.to_string(),
            Err(_) => {
                let text = String::from_utf8_lossy(body).trim().to_owned();

                if text.is_empty() {
                    StatusCode::from_u16(status)
                        .ok()
                        .and_then(|s| s.canonical_reason())
                        .unwrap_or("unknown error")
                        .to_owned()
                } else {
                    text
                }
            }
        };

        Self { status, message }
    }
}

/// Turn a non-2xx response into an error. Successful responses are
/// passed through.
///
/// # Errors
///
/// - the response has a non-2xx status
/// - the body of a failed response cannot be read
pub async fn check_status(res: Response) -> crate::Result<Response> {
    let status = res.status();

    if status.is_success() {
        return Ok(res);
    }

    let body = res.bytes().await?;
    let err = ApiError::from_body(status.as_u16(), &body);

    warn!(status = err.status, "dropbox error: {}", err.message);

    Err(err.into())
}

/// Parse JSON as the associated type if the response has a 2xx status
/// code, otherwise parse it as [`JsonErrorBody`].
///
/// # Errors
///
/// - non-2xx status
/// - invalid or malformed json
pub async fn read_json<T: DeserializeOwned>(res: Response) -> crate::Result<T> {
    let res = check_status(res).await?;
    let body = res.bytes().await?;

    trace!("read {} bytes of json", body.len());

    Ok(serde_json::from_slice(&body)?)
}
