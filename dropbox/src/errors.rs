//! Nobody is perfect.
use thiserror::Error;

use crate::api::{ApiError, ApiErrorKind};

/// Error used by the entire Dropbox crate.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP error.
    #[error("{0}")]
    HttpError(#[from] reqwest::Error),

    /// Url error.
    #[error("invalid url")]
    UrlError(#[from] url::ParseError),

    /// JSON (de)serialization error.
    #[error("json error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Upstream Dropbox error, i.e. a non-2xx response.
    #[error("dropbox error: {0}")]
    Upstream(#[from] ApiError),

    /// A parameter was rejected before sending anything.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// Local I/O error, e.g. when opening a file to upload.
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    /// The source of a chunked upload could not be read.
    #[error("failed to read upload source: {0}")]
    StreamRead(#[source] std::io::Error),

    /// A chunk failed on every permitted attempt. `source` is the error of
    /// the last attempt.
    #[error("{source} (gave up after {attempts} attempts)")]
    RetriesExhausted {
        /// Number of attempts made.
        attempts: u32,
        /// Error of the final attempt.
        source: Box<Error>,
    },

    /// All chunks were uploaded but the session could not be committed.
    #[error("failed to commit upload: {0}")]
    Commit(#[source] Box<Error>),

    /// A file download lacked the `x-dropbox-metadata` header.
    #[error("missing metadata header")]
    MissingMetadata,
}

impl Error {
    /// Numeric HTTP status associated with the error, if any. Wrapped
    /// errors report the status of the error they wrap.
    #[must_use]
    pub fn code(&self) -> Option<u16> {
        match self {
            Error::HttpError(e) => e.status().map(|s| s.as_u16()),
            Error::Upstream(e) => Some(e.status),
            Error::RetriesExhausted { source, .. } | Error::Commit(source) => source.code(),
            _ => None,
        }
    }

    /// Classification of the underlying upstream error, if this error
    /// originates from Dropbox.
    #[must_use]
    pub fn api_kind(&self) -> Option<ApiErrorKind> {
        match self {
            Error::Upstream(e) => Some(e.kind()),
            Error::RetriesExhausted { source, .. } | Error::Commit(source) => source.api_kind(),
            _ => None,
        }
    }

    /// Whether the error came out of a retry loop.
    #[must_use]
    pub fn is_retries_exhausted(&self) -> bool {
        matches!(self, Error::RetriesExhausted { .. })
    }
}
