//! Token-bucket rate limiter.
//!
//! Each limiter owns a bucket of `token_limit` tokens that starts full and is
//! topped up by `tokens_per_period` every `period`. Waiters queue oldest-first
//! with no depth limit, so overload shows up as wait time rather than
//! rejection. Disposing a limiter fails every pending and future acquisition
//! without touching leases that were already granted.

mod lease;


pub use lease::{AcquireCancelled, DenialReason, RateLimitLease};

use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{Semaphore, TryAcquireError};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Shortest replenishment period; a zero window is clamped to this.
pub const MIN_PERIOD: Duration = Duration::from_millis(1);

/// A token bucket with FIFO waiters and periodic replenishment.
///
/// Must be created inside a Tokio runtime: construction spawns the
/// replenishment task. The task holds only a weak reference and stops when
/// the limiter is disposed or dropped.
///
/// # Examples
///
/// ```
/// use rotor::limiter::TokenBucketLimiter;
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let limiter = TokenBucketLimiter::new("example", 2, 2, Duration::from_secs(1));
/// let cancel = CancellationToken::new();
///
/// let lease = limiter.acquire(1, &cancel).await.unwrap();
/// assert!(lease.is_acquired());
/// assert_eq!(limiter.available_permits(), 1);
///
/// limiter.dispose();
/// assert!(!limiter.acquire(1, &cancel).await.unwrap().is_acquired());
/// # }
/// ```
pub struct TokenBucketLimiter {
    label: String,
    token_limit: u32,
    tokens_per_period: u32,
    period: Duration,
    semaphore: Arc<Semaphore>,
    shutdown: CancellationToken,
}

impl TokenBucketLimiter {
    /// Create a limiter with a full bucket and start replenishing it.
    pub fn new(
        label: impl Into<String>,
        token_limit: u32,
        tokens_per_period: u32,
        period: Duration,
    ) -> Self {
        let period = period.max(MIN_PERIOD);
        let semaphore = Arc::new(Semaphore::new(token_limit as usize));
        let shutdown = CancellationToken::new();

        tokio::spawn(replenish(
            Arc::downgrade(&semaphore),
            token_limit,
            tokens_per_period,
            period,
            shutdown.clone(),
        ));

        Self {
            label: label.into(),
            token_limit,
            tokens_per_period,
            period,
            semaphore,
            shutdown,
        }
    }

    /// Wait for `permits` tokens.
    ///
    /// Suspends without blocking a thread until the tokens are granted, the
    /// limiter is disposed (denied lease), or `cancel` fires (error). Waiters
    /// are served strictly in arrival order.
    pub async fn acquire(
        &self,
        permits: u32,
        cancel: &CancellationToken,
    ) -> Result<RateLimitLease, AcquireCancelled> {
        if cancel.is_cancelled() {
            return Err(AcquireCancelled);
        }
        if permits > self.token_limit {
            return Ok(RateLimitLease::denied(DenialReason::ExceedsLimit));
        }
        if permits == 0 {
            return Ok(self.zero_permit_lease());
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(AcquireCancelled),
            acquired = self.semaphore.acquire_many(permits) => match acquired {
                Ok(permit) => {
                    permit.forget();
                    Ok(RateLimitLease::granted(permits))
                }
                Err(_) => Ok(RateLimitLease::denied(DenialReason::Disposed)),
            },
        }
    }

    /// Take `permits` tokens only if they are available right now.
    ///
    /// Does not jump the queue: if earlier callers are waiting, this fails.
    pub fn try_acquire(&self, permits: u32) -> RateLimitLease {
        if permits > self.token_limit {
            return RateLimitLease::denied(DenialReason::ExceedsLimit);
        }
        if permits == 0 {
            return self.zero_permit_lease();
        }

        match self.semaphore.try_acquire_many(permits) {
            Ok(permit) => {
                permit.forget();
                RateLimitLease::granted(permits)
            }
            Err(TryAcquireError::Closed) => RateLimitLease::denied(DenialReason::Disposed),
            Err(TryAcquireError::NoPermits) => RateLimitLease::denied(DenialReason::Exhausted),
        }
    }

    fn zero_permit_lease(&self) -> RateLimitLease {
        if self.is_disposed() {
            RateLimitLease::denied(DenialReason::Disposed)
        } else {
            RateLimitLease::granted(0)
        }
    }

    /// Stop replenishing and fail all pending and future acquisitions.
    ///
    /// Idempotent. Leases already granted stay valid.
    pub fn dispose(&self) {
        if !self.semaphore.is_closed() {
            tracing::debug!(limiter = %self.label, "Disposing rate limiter");
        }
        self.shutdown.cancel();
        self.semaphore.close();
    }

    /// Whether [`dispose`](Self::dispose) has been called.
    pub fn is_disposed(&self) -> bool {
        self.semaphore.is_closed()
    }

    /// Identifies the limiter in logs (proxy address or endpoint pattern).
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Bucket capacity.
    pub fn token_limit(&self) -> u32 {
        self.token_limit
    }

    /// Tokens added per replenishment period.
    pub fn tokens_per_period(&self) -> u32 {
        self.tokens_per_period
    }

    /// Replenishment period (after clamping).
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Tokens currently in the bucket and not promised to a waiter.
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }
}

impl fmt::Debug for TokenBucketLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenBucketLimiter")
            .field("label", &self.label)
            .field("token_limit", &self.token_limit)
            .field("period", &self.period)
            .field("available", &self.available_permits())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

impl fmt::Display for TokenBucketLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{:?}", self.token_limit, self.period)
    }
}

impl Drop for TokenBucketLimiter {
    fn drop(&mut self) {
        self.shutdown.cancel();
        self.semaphore.close();
    }
}

/// Top the bucket up once per period, never above `token_limit`.
async fn replenish(
    semaphore: Weak<Semaphore>,
    token_limit: u32,
    tokens_per_period: u32,
    period: Duration,
    shutdown: CancellationToken,
) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                let Some(semaphore) = semaphore.upgrade() else {
                    break;
                };
                if semaphore.is_closed() {
                    break;
                }
                let missing = (token_limit as usize).saturating_sub(semaphore.available_permits());
                let refill = missing.min(tokens_per_period as usize);
                if refill > 0 {
                    semaphore.add_permits(refill);
                }
            }
        }
    }
}
