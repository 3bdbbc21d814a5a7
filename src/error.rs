//! Error taxonomy for resilient requests.
//!
//! Callers branch on the variant, never on the message text.

use std::time::Duration;
use thiserror::Error;

/// Transport-level failures (no HTTP response was obtained).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NetworkError {
    /// The attempt did not complete within its deadline.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Connection could not be established (DNS, refused, reset).
    #[error("connection failed: {0}")]
    Connect(String),

    /// Any other transport failure while sending or reading the body.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Errors surfaced by [`crate::ResilientClient`] and the retry orchestrator.
#[derive(Debug, Error)]
pub enum ResilienceError {
    /// The circuit breaker rejected the call; no network request was made.
    #[error("circuit breaker is open; request not attempted")]
    CircuitOpen,

    /// The caller cancelled the operation.
    #[error("request aborted by caller")]
    Aborted,

    /// Every attempt failed; `last` is the final underlying failure.
    #[error("giving up after {attempts} attempts: {last}")]
    MaxRetriesExceeded {
        attempts: u32,
        #[source]
        last: Box<ResilienceError>,
    },

    /// Transport-level failure.
    #[error(transparent)]
    Network(#[from] NetworkError),

    /// The server answered with a non-2xx status.
    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    /// The request could not be built (bad URL, bad header).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ResilienceError {
    /// HTTP status carried by this error, looking through `MaxRetriesExceeded`.
    pub fn status(&self) -> Option<u16> {
        match self {
            ResilienceError::HttpStatus { status, .. } => Some(*status),
            ResilienceError::MaxRetriesExceeded { last, .. } => last.status(),
            _ => None,
        }
    }

    /// True when the error came from a timed out attempt.
    pub fn is_timeout(&self) -> bool {
        match self {
            ResilienceError::Network(NetworkError::Timeout(_)) => true,
            ResilienceError::MaxRetriesExceeded { last, .. } => last.is_timeout(),
            _ => false,
        }
    }

    /// Stable short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ResilienceError::CircuitOpen => "circuit_open",
            ResilienceError::Aborted => "aborted",
            ResilienceError::MaxRetriesExceeded { .. } => "max_retries_exceeded",
            ResilienceError::Network(NetworkError::Timeout(_)) => "timeout",
            ResilienceError::Network(_) => "network",
            ResilienceError::HttpStatus { .. } => "http_status",
            ResilienceError::InvalidRequest(_) => "invalid_request",
        }
    }
}

/// Result type for resilient operations.
pub type ResilienceResult<T> = Result<T, ResilienceError>;
