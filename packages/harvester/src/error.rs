//! Typed errors for the harvester library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) so callers can tell a
//! retryable network failure from a missing record or a bad configuration.

use thiserror::Error;
use uuid::Uuid;

use crate::types::job::JobStatus;

/// Errors raised while fetching a page over HTTP.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Server answered with a non-success status code
    #[error("HTTP {status} for {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    /// Connection, timeout or other transport failure
    #[error("transport error for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// URL could not be parsed or is not http(s)
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    /// Request could not be built (bad header, bad proxy, ...)
    #[error("request build error for {url}: {source}")]
    Build {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The client session was already released
    #[error("HTTP client is closed")]
    Closed,
}

impl FetchError {
    /// Whether the failure is worth another attempt.
    ///
    /// Status codes, timeouts and connection problems are transient. Anything
    /// caused by the request itself will fail the same way on every attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Status { .. } => true,
            FetchError::Transport { source, .. } => !source.is_builder(),
            FetchError::InvalidUrl { .. } | FetchError::Build { .. } | FetchError::Closed => {
                false
            }
        }
    }

    pub(crate) fn from_reqwest(url: &str, source: reqwest::Error) -> Self {
        if source.is_builder() {
            FetchError::Build {
                url: url.to_string(),
                source,
            }
        } else {
            FetchError::Transport {
                url: url.to_string(),
                source,
            }
        }
    }
}

/// A single job card did not have the expected structure.
#[derive(Debug, Error)]
pub enum CardError {
    #[error("job card has no enclosing container")]
    MissingContainer,

    #[error("job card container has no job identifier")]
    MissingJobId,

    #[error("detail page fetch failed: {0}")]
    Detail(#[from] FetchError),
}

/// Errors from a job store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No item under the given key
    #[error("job {id} not found for author {author}")]
    NotFound { id: Uuid, author: String },

    /// The backend rejected or failed the operation
    #[error("storage error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A stored item could not be mapped back into a job
    #[error("corrupt item: {0}")]
    Corrupt(String),
}

impl StoreError {
    pub fn backend<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        StoreError::Backend(Box::new(error))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Invalid configuration. Fatal at startup, never retried.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("proxy list cannot be empty")]
    EmptyProxyList,

    #[error("both proxy username and password must be provided or neither")]
    PartialProxyCredentials,

    #[error("invalid proxy endpoint {endpoint}: {reason}")]
    InvalidProxy { endpoint: String, reason: String },

    #[error("invalid setting {name}: {reason}")]
    InvalidSetting { name: &'static str, reason: String },
}

/// Illegal job lifecycle change.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum JobError {
    #[error("cannot move job from {from} to {to}")]
    InvalidTransition { from: JobStatus, to: JobStatus },
}

/// Pagination token could not be encoded or decoded.
#[derive(Debug, Error)]
pub enum CursorError {
    #[error("invalid cursor: not valid base64")]
    Base64(#[from] base64::DecodeError),

    #[error("invalid cursor: {0}")]
    Json(#[from] serde_json::Error),
}

/// A scrape run aborted before the import phase.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("search page fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("invalid scrape configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type alias for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;
