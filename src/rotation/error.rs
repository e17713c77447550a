//! Error types for orchestrated sends

use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::limiter::DenialReason;
use crate::transport::TransportError;

/// Which of the two rate limits denied a lease.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LimitScope {
    /// Target-pattern limit, held for the whole request
    Endpoint,
    /// Per-proxy limit, held for one attempt
    Proxy,
}

impl fmt::Display for LimitScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LimitScope::Endpoint => f.write_str("endpoint"),
            LimitScope::Proxy => f.write_str("proxy"),
        }
    }
}

/// Why a single candidate was passed over.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttemptError {
    /// The proxy's limiter did not grant a lease; nothing was sent.
    #[error("proxy rate limit denied: {0}")]
    LimitDenied(DenialReason),

    /// The send failed in a way another egress path might not.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// One failed candidate, collected while failing over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptFailure {
    /// Proxy address, or `direct`
    pub egress: String,
    pub error: AttemptError,
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.egress, self.error)
    }
}

/// Errors returned by [`Rotator::submit`](super::Rotator::submit).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RotationError {
    /// The endpoint limiter refused the request; no candidate was tried.
    #[error("{scope} rate limit '{limiter}' denied the request: {reason}")]
    LimitDenied {
        scope: LimitScope,
        limiter: String,
        reason: DenialReason,
    },

    /// The caller cancelled. Never wrapped into `AllExhausted`.
    #[error("request cancelled")]
    Cancelled,

    /// A transport error returned unchanged: either the request is invalid,
    /// or there were no egress paths to fail over between.
    #[error(transparent)]
    Transport(TransportError),

    /// Every candidate failed or was denied.
    #[error("all {} egress paths failed: {}", .failures.len(), FailureList(.failures))]
    AllExhausted { failures: Vec<AttemptFailure> },
}

impl RotationError {
    /// Short label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            RotationError::LimitDenied { .. } => "limit_denied",
            RotationError::Cancelled => "cancelled",
            RotationError::Transport(_) => "transport",
            RotationError::AllExhausted { .. } => "all_exhausted",
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, RotationError::Cancelled)
    }

    /// Collected per-candidate failures (empty unless `AllExhausted`).
    pub fn failures(&self) -> &[AttemptFailure] {
        match self {
            RotationError::AllExhausted { failures } => failures,
            _ => &[],
        }
    }
}

struct FailureList<'a>(&'a [AttemptFailure]);

impl fmt::Display for FailureList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", failure)?;
        }
        Ok(())
    }
}
