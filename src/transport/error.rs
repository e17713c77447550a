//! Error types for transport operations.

use std::time::Duration;
use thiserror::Error;

/// Errors raised while sending a request through one egress path.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// DNS, connection refused, proxy handshake failure, bad proxy address.
    #[error("connection failed: {0}")]
    Connect(String),

    /// The attempt exceeded its deadline.
    #[error("request timed out after {0}ms")]
    Timeout(u64),

    /// The connection broke after it was established.
    #[error("connection reset: {0}")]
    Reset(String),

    /// The request itself is malformed; no egress path can fix it.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl TransportError {
    /// Whether another egress path might succeed where this one failed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, TransportError::InvalidRequest(_))
    }

    /// Short label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            TransportError::Connect(_) => "connect",
            TransportError::Timeout(_) => "timeout",
            TransportError::Reset(_) => "reset",
            TransportError::InvalidRequest(_) => "invalid_request",
        }
    }

    /// Classify a reqwest failure.
    pub fn from_reqwest(error: reqwest::Error, timeout: Duration) -> Self {
        if error.is_builder() {
            TransportError::InvalidRequest(error.to_string())
        } else if error.is_timeout() {
            TransportError::Timeout(timeout.as_millis() as u64)
        } else if error.is_connect() {
            TransportError::Connect(error.to_string())
        } else {
            TransportError::Reset(error.to_string())
        }
    }
}
