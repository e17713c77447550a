//! Proxy pool manager.
//!
//! Owns the active set of egress paths and their health counters. A
//! configuration change builds a brand new [`ProxySet`], swaps it in under a
//! short write lock and only then disposes the old set's limiters. Requests
//! hold an `Arc` to the set they started with, so a swap never changes the
//! candidates of a request already in flight.

mod endpoint;

#[cfg(test)]
mod tests;

pub use endpoint::{score, ProxyEndpoint, ProxyView, DIRECT};

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use crate::config::RotorConfig;
use crate::limiter::TokenBucketLimiter;

/// An immutable set of egress paths built from one configuration snapshot.
#[derive(Debug)]
pub struct ProxySet {
    endpoints: Vec<Arc<ProxyEndpoint>>,
    built_at: DateTime<Utc>,
}

impl ProxySet {
    /// Wrap already-built endpoints, in configuration order.
    pub fn new(endpoints: Vec<ProxyEndpoint>) -> Self {
        Self {
            endpoints: endpoints.into_iter().map(Arc::new).collect(),
            built_at: Utc::now(),
        }
    }

    /// Build the egress paths described by `config`.
    ///
    /// With no proxies configured, the set holds a single direct path limited
    /// by the defaults. Otherwise each proxy with a non-blank address becomes
    /// one entry, limited by its own limit/window or the defaults. A limiter
    /// is only built when the limit is positive and the window is known and
    /// non-negative. Must be called inside a Tokio runtime.
    pub fn build(config: &RotorConfig) -> Self {
        let defaults = (
            config.default_proxy_limit,
            config.default_proxy_window_seconds,
        );

        if config.proxies.is_empty() {
            tracing::debug!(
                limit = ?defaults.0,
                window_seconds = ?defaults.1,
                "No proxies configured, using direct connection"
            );
            let limiter = build_limiter(DIRECT, defaults.0, defaults.1);
            return Self::new(vec![ProxyEndpoint::direct(limiter)]);
        }

        let mut endpoints = Vec::with_capacity(config.proxies.len());
        for (i, proxy) in config.proxies.iter().enumerate() {
            let address = proxy.address.trim();
            if address.is_empty() {
                tracing::warn!(index = i, "Skipping proxy with empty address");
                continue;
            }

            let (limit, window) = proxy.effective_limit(defaults.0, defaults.1);
            let limiter = build_limiter(address, limit, window);
            endpoints.push(ProxyEndpoint::new(Some(address.to_string()), limiter));
        }

        if endpoints.is_empty() {
            tracing::warn!("Every configured proxy was skipped; requests will go direct");
        }

        Self::new(endpoints)
    }

    /// Endpoints in configuration order.
    pub fn endpoints(&self) -> &[Arc<ProxyEndpoint>] {
        &self.endpoints
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// When this set was built.
    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    /// Endpoints ordered by descending score.
    ///
    /// Scores are read once per endpoint before sorting so concurrent
    /// counter updates cannot make the comparison inconsistent. The sort is
    /// stable: equal scores keep configuration order.
    pub fn ranked(&self) -> Vec<Arc<ProxyEndpoint>> {
        let mut scored: Vec<(f64, &Arc<ProxyEndpoint>)> = self
            .endpoints
            .iter()
            .map(|endpoint| (endpoint.score(), endpoint))
            .collect();

        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored
            .into_iter()
            .map(|(_, endpoint)| Arc::clone(endpoint))
            .collect()
    }

    fn dispose(&self) {
        for limiter in self.endpoints.iter().filter_map(|e| e.limiter()) {
            limiter.dispose();
        }
    }
}

fn build_limiter(
    label: &str,
    limit: Option<i32>,
    window_seconds: Option<i64>,
) -> Option<TokenBucketLimiter> {
    match (limit, window_seconds) {
        (Some(limit), Some(window)) if limit > 0 && window >= 0 => {
            let permits = limit as u32;
            Some(TokenBucketLimiter::new(
                label,
                permits,
                permits,
                Duration::from_secs(window as u64),
            ))
        }
        _ => None,
    }
}

/// Holds the active [`ProxySet`] and replaces it on reload.
///
/// # Examples
///
/// ```
/// use rotor::config::{ProxyConfig, RotorConfig};
/// use rotor::pool::ProxyPool;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mut config = RotorConfig::default();
/// config.proxies.push(ProxyConfig::new("http://10.0.0.1:3128"));
/// config.proxies.push(ProxyConfig::new("http://10.0.0.2:3128"));
///
/// let pool = ProxyPool::from_config(&config);
/// let ranked = pool.ranked();
/// assert_eq!(ranked.len(), 2);
/// assert_eq!(ranked[0].address(), Some("http://10.0.0.1:3128"));
/// # }
/// ```
#[derive(Debug)]
pub struct ProxyPool {
    active: RwLock<Arc<ProxySet>>,
    generation: AtomicU64,
}

impl ProxyPool {
    /// Create a pool whose active set is `set`.
    pub fn new(set: ProxySet) -> Self {
        Self {
            active: RwLock::new(Arc::new(set)),
            generation: AtomicU64::new(0),
        }
    }

    /// Build the active set from configuration.
    pub fn from_config(config: &RotorConfig) -> Self {
        Self::new(ProxySet::build(config))
    }

    /// The active set. Callers keep using it even if a swap happens later.
    pub fn snapshot(&self) -> Arc<ProxySet> {
        let active = self.active.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&active)
    }

    /// Install `set` as the active set, then dispose the previous set's limiters.
    ///
    /// The lock covers only the pointer exchange. In-flight requests that
    /// already hold the old set keep their granted leases; their future
    /// acquisitions against old limiters are denied.
    pub fn swap(&self, set: ProxySet) {
        let new_len = set.len();
        let previous = {
            let mut active = self.active.write().unwrap_or_else(PoisonError::into_inner);
            self.generation.fetch_add(1, Ordering::SeqCst);
            std::mem::replace(&mut *active, Arc::new(set))
        };

        previous.dispose();
        tracing::info!(
            previous = previous.len(),
            current = new_len,
            generation = self.generation(),
            "Proxy pool replaced"
        );
    }

    /// Rebuild from `config` and swap.
    pub fn rebuild(&self, config: &RotorConfig) {
        self.swap(ProxySet::build(config));
    }

    /// The active set ordered by descending score.
    pub fn ranked(&self) -> Vec<Arc<ProxyEndpoint>> {
        self.snapshot().ranked()
    }

    /// Number of swaps since creation.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// Record the outcome of an attempt through `endpoint`.
    pub fn record_outcome(&self, endpoint: &ProxyEndpoint, success: bool, latency: Duration) {
        endpoint.record_outcome(success, latency);
    }
}
