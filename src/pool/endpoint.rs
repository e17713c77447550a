use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::limiter::TokenBucketLimiter;

/// Name used for the egress path that bypasses every proxy.
pub const DIRECT: &str = "direct";

/// One egress path: a proxy, or the direct connection.
///
/// Health counters only ever grow; they reset only when the whole pool is
/// rebuilt. The score is recomputed from the counters on every read.
///
/// # Examples
///
/// ```
/// use rotor::pool::ProxyEndpoint;
/// use std::time::Duration;
///
/// let proxy = ProxyEndpoint::new(Some("http://10.0.0.1:3128".to_string()), None);
/// assert_eq!(proxy.success_rate(), 1.0);
///
/// proxy.record_outcome(true, Duration::from_millis(99));
/// proxy.record_outcome(false, Duration::from_millis(5));
/// assert_eq!(proxy.success_rate(), 0.5);
/// assert_eq!(proxy.score(), 5.0); // 0.5 * 1000 / (99 + 1)
/// ```
#[derive(Debug)]
pub struct ProxyEndpoint {
    address: Option<String>,
    limiter: Option<Arc<TokenBucketLimiter>>,
    success_count: AtomicU64,
    failure_count: AtomicU64,
    total_latency_us: AtomicU64,
}

impl ProxyEndpoint {
    /// Create an endpoint with zeroed counters. `None` means direct.
    pub fn new(address: Option<String>, limiter: Option<TokenBucketLimiter>) -> Self {
        Self {
            address,
            limiter: limiter.map(Arc::new),
            success_count: AtomicU64::new(0),
            failure_count: AtomicU64::new(0),
            total_latency_us: AtomicU64::new(0),
        }
    }

    /// The synthetic direct path.
    pub fn direct(limiter: Option<TokenBucketLimiter>) -> Self {
        Self::new(None, limiter)
    }

    /// Proxy URL, or `None` for the direct path.
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn is_direct(&self) -> bool {
        self.address.is_none()
    }

    /// Address for logs and tables; [`DIRECT`] for the direct path.
    pub fn display_name(&self) -> &str {
        self.address.as_deref().unwrap_or(DIRECT)
    }

    /// Per-proxy limiter, if one is configured.
    pub fn limiter(&self) -> Option<&Arc<TokenBucketLimiter>> {
        self.limiter.as_ref()
    }

    /// Record an attempt. Lock-free; safe under any number of callers.
    ///
    /// Failures only bump the failure counter; latency is tracked for
    /// successful attempts alone.
    pub fn record_outcome(&self, success: bool, latency: Duration) {
        if success {
            let micros = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX);
            self.success_count.fetch_add(1, Ordering::Relaxed);
            self.total_latency_us.fetch_add(micros, Ordering::Relaxed);
        } else {
            self.failure_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn success_count(&self) -> u64 {
        self.success_count.load(Ordering::Relaxed)
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    /// Sum of the latencies of all successful attempts.
    pub fn total_latency(&self) -> Duration {
        Duration::from_micros(self.total_latency_us.load(Ordering::Relaxed))
    }

    /// Successes over attempts; 1.0 before the first attempt.
    pub fn success_rate(&self) -> f64 {
        let successes = self.success_count();
        let attempts = successes + self.failure_count();
        if attempts == 0 {
            return 1.0;
        }
        successes as f64 / attempts as f64
    }

    /// Mean latency of successful attempts in milliseconds; 0 with no successes.
    pub fn average_latency_ms(&self) -> f64 {
        let successes = self.success_count();
        if successes == 0 {
            return 0.0;
        }
        self.total_latency_us.load(Ordering::Relaxed) as f64 / 1000.0 / successes as f64
    }

    /// Health score: `success_rate * 1000 / (average_latency_ms + 1)`.
    ///
    /// An untried endpoint scores 1000, the maximum.
    pub fn score(&self) -> f64 {
        score(self.success_rate(), self.average_latency_ms())
    }

    /// Point-in-time read model for diagnostics.
    pub fn snapshot(&self) -> ProxyView {
        self.into()
    }
}

/// Score an endpoint from its success rate and mean latency.
pub fn score(success_rate: f64, average_latency_ms: f64) -> f64 {
    success_rate * 1000.0 / (average_latency_ms + 1.0)
}

/// Serializable view of a [`ProxyEndpoint`] (atomics read once).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxyView {
    pub name: String,
    pub address: Option<String>,
    pub success_count: u64,
    pub failure_count: u64,
    pub success_rate: f64,
    pub average_latency_ms: f64,
    pub score: f64,
    /// Limiter as `limit/period`, if any
    pub limit: Option<String>,
}

impl From<&ProxyEndpoint> for ProxyView {
    fn from(endpoint: &ProxyEndpoint) -> Self {
        let success_count = endpoint.success_count();
        let failure_count = endpoint.failure_count();
        let attempts = success_count + failure_count;
        let success_rate = if attempts == 0 {
            1.0
        } else {
            success_count as f64 / attempts as f64
        };
        let average_latency_ms = if success_count == 0 {
            0.0
        } else {
            endpoint.total_latency().as_micros() as f64 / 1000.0 / success_count as f64
        };

        Self {
            name: endpoint.display_name().to_string(),
            address: endpoint.address.clone(),
            success_count,
            failure_count,
            success_rate,
            average_latency_ms,
            score: score(success_rate, average_latency_ms),
            limit: endpoint.limiter.as_ref().map(|l| l.to_string()),
        }
    }
}
