//! Rate limit leases

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Why a lease was not granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    /// The limiter was disposed before or while waiting
    Disposed,
    /// More permits were requested than the bucket can ever hold
    ExceedsLimit,
    /// A non-waiting acquisition found too few tokens
    Exhausted,
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenialReason::Disposed => f.write_str("limiter disposed"),
            DenialReason::ExceedsLimit => f.write_str("request exceeds bucket size"),
            DenialReason::Exhausted => f.write_str("no tokens available"),
        }
    }
}

/// Outcome of an acquisition against a [`TokenBucketLimiter`].
///
/// Tokens taken from a bucket are consumed, not borrowed, so dropping a
/// granted lease does not return them; the bucket refills on its own
/// schedule.
///
/// [`TokenBucketLimiter`]: super::TokenBucketLimiter
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "check is_acquired() before proceeding"]
pub struct RateLimitLease {
    permits: u32,
    denial: Option<DenialReason>,
}

impl RateLimitLease {
    pub(crate) fn granted(permits: u32) -> Self {
        Self {
            permits,
            denial: None,
        }
    }

    pub(crate) fn denied(reason: DenialReason) -> Self {
        Self {
            permits: 0,
            denial: Some(reason),
        }
    }

    /// Whether the permits were granted.
    pub fn is_acquired(&self) -> bool {
        self.denial.is_none()
    }

    /// Number of permits this lease holds (0 when denied).
    pub fn permits(&self) -> u32 {
        self.permits
    }

    /// Reason for denial, if denied.
    pub fn denial(&self) -> Option<DenialReason> {
        self.denial
    }
}

/// The caller's cancellation token fired while waiting for permits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("rate limit acquisition cancelled")]
pub struct AcquireCancelled;
