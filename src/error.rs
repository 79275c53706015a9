use std::time::Duration;

use thiserror::Error;

/// Failure of a single provider request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("provider returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("request cancelled")]
    Cancelled,

    #[error("unreadable provider payload: {0}")]
    Payload(String),
}

impl FetchError {
    /// Transient failures worth another attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Network(_) | FetchError::Timeout(_) => true,
            FetchError::HttpStatus { status, .. } => {
                matches!(status, 408 | 425 | 429) || (500..600).contains(status)
            }
            FetchError::InvalidRequest(_) | FetchError::Cancelled | FetchError::Payload(_) => false,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_builder() {
            FetchError::InvalidRequest(e.to_string())
        } else if e.is_decode() || e.is_body() {
            FetchError::Payload(e.to_string())
        } else if let Some(status) = e.status() {
            FetchError::HttpStatus {
                status: status.as_u16(),
                body: String::new(),
            }
        } else {
            FetchError::Network(e.to_string())
        }
    }
}

/// Failure of a whole sync cycle
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// Fetch failed and there is no cached data to fall back on
    #[error("no fixture data available: {source}")]
    NoDataAvailable { source: FetchError },

    /// Fetch failed for a reason that is not worth a fallback (e.g. cancelled)
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("cache store error: {0}")]
    Store(String),
}

impl From<sqlx::Error> for SyncError {
    fn from(e: sqlx::Error) -> Self {
        SyncError::Store(e.to_string())
    }
}
