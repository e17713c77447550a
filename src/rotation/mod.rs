//! Rotation orchestrator.
//!
//! Drives one request through the acquire → select → send → record → retry
//! cycle:
//!
//! 1. Acquire a permit from the endpoint limiter matching the target (if any)
//!    and hold it until the request finishes. Denial is fatal.
//! 2. Rank the active proxy set by score. An empty set sends directly.
//! 3. For each candidate, best first: acquire its proxy permit (denial skips
//!    the candidate), send a fresh copy of the request through it, record
//!    the outcome, and return on the first success.
//! 4. If every candidate fails, return all collected failures at once.
//!
//! Cancellation reaches every wait and the in-flight send, and is always
//! surfaced as [`RotationError::Cancelled`].

mod error;


pub use error::{AttemptError, AttemptFailure, LimitScope, RotationError};

use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::config::RotorConfig;
use crate::endpoints::{EndpointLimiterRegistry, RuleSet};
use crate::limiter::{DenialReason, RateLimitLease, TokenBucketLimiter};
use crate::logging::generate_request_id;
use crate::pool::{ProxyEndpoint, ProxyPool, ProxySet};
use crate::transport::{OutboundRequest, OutboundResponse, Transport, TransportError};

/// Dispatches requests across the proxy pool under both rate limits.
///
/// # Examples
///
/// ```
/// use rotor::config::{ProxyConfig, RotorConfig};
/// use rotor::rotation::Rotator;
/// use rotor::transport::HttpTransport;
/// use std::sync::Arc;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mut config = RotorConfig::default();
/// config.proxies.push(ProxyConfig::new("http://10.0.0.1:3128"));
///
/// let rotator = Rotator::new(&config, Arc::new(HttpTransport::default()));
/// assert_eq!(rotator.ranked_proxies().len(), 1);
/// assert!(rotator.limiter_for(Some("https://example.com/")).is_none());
/// # }
/// ```
pub struct Rotator {
    pool: ProxyPool,
    endpoints: EndpointLimiterRegistry,
    transport: Arc<dyn Transport>,
}

impl Rotator {
    /// Build the proxy pool and endpoint registry from `config`.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn new(config: &RotorConfig, transport: Arc<dyn Transport>) -> Self {
        Self::with_parts(
            ProxyPool::from_config(config),
            EndpointLimiterRegistry::from_config(config),
            transport,
        )
    }

    pub fn with_parts(
        pool: ProxyPool,
        endpoints: EndpointLimiterRegistry,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            pool,
            endpoints,
            transport,
        }
    }

    /// Replace the proxy pool and endpoint rules with ones built from `config`.
    ///
    /// Both new sets are built before either is installed. Requests already
    /// running keep the snapshots they captured.
    pub fn apply_config(&self, config: &RotorConfig) {
        let proxies = ProxySet::build(config);
        let rules = RuleSet::build(config);

        self.pool.swap(proxies);
        self.endpoints.swap(rules);
    }

    pub fn pool(&self) -> &ProxyPool {
        &self.pool
    }

    pub fn endpoints(&self) -> &EndpointLimiterRegistry {
        &self.endpoints
    }

    /// Active proxies, best first.
    pub fn ranked_proxies(&self) -> Vec<Arc<ProxyEndpoint>> {
        self.pool.ranked()
    }

    /// Endpoint limiter that would apply to `target`.
    pub fn limiter_for(&self, target: Option<&str>) -> Option<Arc<TokenBucketLimiter>> {
        self.endpoints.resolve(target)
    }

    /// Send `request`, failing over across proxies until one succeeds.
    ///
    /// Returns the first successful response. Any HTTP status counts as
    /// success; only transport-level failures trigger failover.
    pub async fn submit(
        &self,
        request: OutboundRequest,
        cancel: &CancellationToken,
    ) -> Result<OutboundResponse, RotationError> {
        let span = tracing::info_span!(
            "submit",
            request_id = %generate_request_id(),
            method = %request.method,
            target = request.target().unwrap_or_default(),
        );

        let result = self.dispatch(request, cancel).instrument(span).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.kind(),
        };
        metrics::counter!("rotor_requests_total", "outcome" => outcome).increment(1);
        result
    }

    async fn dispatch(
        &self,
        request: OutboundRequest,
        cancel: &CancellationToken,
    ) -> Result<OutboundResponse, RotationError> {
        if cancel.is_cancelled() {
            return Err(RotationError::Cancelled);
        }

        // Held until this function returns, whatever the outcome.
        let _endpoint_lease = self.acquire_endpoint_permit(&request, cancel).await?;

        let ranked = self.pool.ranked();
        if ranked.is_empty() {
            tracing::debug!("No egress paths available, sending direct");
            return match self.send(request, None, cancel).await {
                Some(result) => result.map_err(RotationError::Transport),
                None => Err(RotationError::Cancelled),
            };
        }

        let mut failures = Vec::new();
        for (rank, candidate) in ranked.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(RotationError::Cancelled);
            }
            let egress = candidate.display_name();

            // Released at the end of this iteration, whatever the outcome.
            let _proxy_lease = match candidate.limiter() {
                Some(limiter) => {
                    let lease = limiter
                        .acquire(1, cancel)
                        .await
                        .map_err(|_| RotationError::Cancelled)?;
                    if !lease.is_acquired() {
                        let reason = lease.denial().unwrap_or(DenialReason::Disposed);
                        tracing::warn!(egress, %reason, "Proxy rate limit denied, skipping");
                        metrics::counter!("rotor_limit_denied_total", "scope" => "proxy")
                            .increment(1);
                        failures.push(AttemptFailure {
                            egress: egress.to_string(),
                            error: AttemptError::LimitDenied(reason),
                        });
                        continue;
                    }
                    Some(lease)
                }
                None => None,
            };

            tracing::debug!(egress, rank, score = candidate.score(), "Attempting");
            let started = Instant::now();
            let Some(result) = self
                .send(request.fresh_copy(), candidate.address(), cancel)
                .await
            else {
                tracing::debug!(egress, "Cancelled during send");
                return Err(RotationError::Cancelled);
            };
            let elapsed = started.elapsed();

            match result {
                Ok(response) => {
                    self.pool.record_outcome(candidate, true, elapsed);
                    record_attempt(egress, "success", Some(elapsed));
                    tracing::debug!(
                        egress,
                        status = response.status.as_u16(),
                        latency_ms = elapsed.as_millis() as u64,
                        "Attempt succeeded"
                    );
                    return Ok(response);
                }
                Err(error) if error.is_retryable() => {
                    self.pool.record_outcome(candidate, false, elapsed);
                    record_attempt(egress, error.kind(), None);
                    tracing::warn!(egress, error = %error, "Attempt failed, trying next egress path");
                    failures.push(AttemptFailure {
                        egress: egress.to_string(),
                        error: error.into(),
                    });
                }
                Err(error) => {
                    tracing::warn!(egress, error = %error, "Request rejected by transport");
                    return Err(RotationError::Transport(error));
                }
            }
        }

        tracing::error!(attempts = failures.len(), "All egress paths failed");
        Err(RotationError::AllExhausted { failures })
    }

    /// Wait for the endpoint permit, if a rule matches the target.
    async fn acquire_endpoint_permit(
        &self,
        request: &OutboundRequest,
        cancel: &CancellationToken,
    ) -> Result<Option<RateLimitLease>, RotationError> {
        let Some(rule) = self.endpoints.resolve_rule(request.target()) else {
            return Ok(None);
        };

        let lease = rule
            .limiter
            .acquire(1, cancel)
            .await
            .map_err(|_| RotationError::Cancelled)?;

        if lease.is_acquired() {
            return Ok(Some(lease));
        }

        let reason = lease.denial().unwrap_or(DenialReason::Disposed);
        tracing::warn!(pattern = %rule.pattern, %reason, "Endpoint rate limit denied");
        metrics::counter!("rotor_limit_denied_total", "scope" => "endpoint").increment(1);
        Err(RotationError::LimitDenied {
            scope: LimitScope::Endpoint,
            limiter: rule.pattern,
            reason,
        })
    }

    /// Send one attempt; `None` if `cancel` fired first (the send is dropped).
    async fn send(
        &self,
        request: OutboundRequest,
        egress: Option<&str>,
        cancel: &CancellationToken,
    ) -> Option<Result<OutboundResponse, TransportError>> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = self.transport.send(request, egress) => Some(result),
        }
    }
}

fn record_attempt(egress: &str, outcome: &'static str, elapsed: Option<std::time::Duration>) {
    metrics::counter!(
        "rotor_attempts_total",
        "egress" => egress.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    if let Some(elapsed) = elapsed {
        metrics::histogram!("rotor_attempt_duration_seconds", "egress" => egress.to_string())
            .record(elapsed.as_secs_f64());
    }
}
