//! Endpoint limiter registry.
//!
//! Maps target URL patterns to rate limiters. Resolution picks the most
//! specific (longest) matching pattern; among patterns of equal length the
//! one listed first in configuration wins. Like the proxy pool, the whole
//! rule set is rebuilt on reload, swapped in, and the old limiters disposed.

mod rule;


pub use rule::EndpointLimitRule;

use serde::Serialize;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use crate::config::RotorConfig;
use crate::limiter::TokenBucketLimiter;

/// Rules built from one configuration snapshot, in configuration order.
#[derive(Debug, Default)]
pub struct RuleSet {
    rules: Vec<EndpointLimitRule>,
}

impl RuleSet {
    pub fn new(rules: Vec<EndpointLimitRule>) -> Self {
        Self { rules }
    }

    /// Build one rule per configured endpoint.
    ///
    /// Rules without a positive limit and a non-negative window are skipped,
    /// as are repeats of a pattern already seen. Must be called inside a
    /// Tokio runtime.
    pub fn build(config: &RotorConfig) -> Self {
        let mut seen = HashSet::new();
        let mut rules = Vec::with_capacity(config.endpoints.len());

        for endpoint in &config.endpoints {
            if endpoint.limit <= 0 || endpoint.window_seconds < 0 {
                tracing::warn!(
                    pattern = %endpoint.pattern,
                    limit = endpoint.limit,
                    window_seconds = endpoint.window_seconds,
                    "Skipping endpoint rule without a usable limit"
                );
                continue;
            }
            if !seen.insert(endpoint.pattern.as_str()) {
                tracing::warn!(pattern = %endpoint.pattern, "Skipping duplicate endpoint rule");
                continue;
            }

            rules.push(EndpointLimitRule::new(
                endpoint.pattern.clone(),
                endpoint.limit as u32,
                Duration::from_secs(endpoint.window_seconds as u64),
            ));
        }

        Self { rules }
    }

    pub fn rules(&self) -> &[EndpointLimitRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The most specific rule matching `target`, if any.
    pub fn resolve(&self, target: &str) -> Option<&EndpointLimitRule> {
        let mut best: Option<&EndpointLimitRule> = None;
        for rule in self.rules.iter().filter(|rule| rule.matches(target)) {
            if best.map_or(true, |b| rule.pattern().len() > b.pattern().len()) {
                best = Some(rule);
            }
        }
        best
    }

    fn dispose(&self) {
        for rule in &self.rules {
            rule.limiter().dispose();
        }
    }
}

/// A successful resolution: the winning pattern and its limiter.
#[derive(Debug, Clone)]
pub struct RuleMatch {
    pub pattern: String,
    pub limiter: Arc<TokenBucketLimiter>,
}

/// Diagnostic description of an active rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleView {
    pub pattern: String,
    pub limit: u32,
    pub window_seconds: u64,
    pub available: usize,
}

/// Holds the active [`RuleSet`] and replaces it on reload.
///
/// # Examples
///
/// ```
/// use rotor::config::{EndpointRuleConfig, RotorConfig};
/// use rotor::endpoints::EndpointLimiterRegistry;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mut config = RotorConfig::default();
/// config.endpoints.push(EndpointRuleConfig::new("https://a/*", 10, 1));
/// config.endpoints.push(EndpointRuleConfig::new("https://a/b*", 1, 1));
///
/// let registry = EndpointLimiterRegistry::from_config(&config);
/// let matched = registry.resolve_rule(Some("https://a/b/c")).unwrap();
/// assert_eq!(matched.pattern, "https://a/b*");
/// assert!(registry.resolve(Some("https://other/")).is_none());
/// assert!(registry.resolve(None).is_none());
/// # }
/// ```
#[derive(Debug)]
pub struct EndpointLimiterRegistry {
    active: RwLock<Arc<RuleSet>>,
    generation: AtomicU64,
}

impl EndpointLimiterRegistry {
    pub fn new(rules: RuleSet) -> Self {
        Self {
            active: RwLock::new(Arc::new(rules)),
            generation: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &RotorConfig) -> Self {
        Self::new(RuleSet::build(config))
    }

    /// The active rule set.
    pub fn snapshot(&self) -> Arc<RuleSet> {
        let active = self.active.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&active)
    }

    /// Install `rules`, then dispose the previous rules' limiters.
    pub fn swap(&self, rules: RuleSet) {
        let new_len = rules.len();
        let previous = {
            let mut active = self.active.write().unwrap_or_else(PoisonError::into_inner);
            self.generation.fetch_add(1, Ordering::SeqCst);
            std::mem::replace(&mut *active, Arc::new(rules))
        };

        previous.dispose();
        tracing::info!(
            previous = previous.len(),
            current = new_len,
            generation = self.generation(),
            "Endpoint rules replaced"
        );
    }

    /// Rebuild from `config` and swap.
    pub fn rebuild(&self, config: &RotorConfig) {
        self.swap(RuleSet::build(config));
    }

    /// Limiter for the most specific rule matching `target`.
    ///
    /// Returns `None` for a missing target or when nothing matches.
    pub fn resolve(&self, target: Option<&str>) -> Option<Arc<TokenBucketLimiter>> {
        self.resolve_rule(target).map(|m| m.limiter)
    }

    /// Like [`resolve`](Self::resolve), also reporting the winning pattern.
    pub fn resolve_rule(&self, target: Option<&str>) -> Option<RuleMatch> {
        let target = target?;
        let rules = self.snapshot();
        rules.resolve(target).map(|rule| RuleMatch {
            pattern: rule.pattern().to_string(),
            limiter: Arc::clone(rule.limiter()),
        })
    }

    /// Active rules in configuration order.
    pub fn rules(&self) -> Vec<RuleView> {
        self.snapshot()
            .rules()
            .iter()
            .map(|rule| RuleView {
                pattern: rule.pattern().to_string(),
                limit: rule.limit(),
                window_seconds: rule.window().as_secs(),
                available: rule.limiter().available_permits(),
            })
            .collect()
    }

    /// Number of swaps since creation.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}
