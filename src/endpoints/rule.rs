use std::sync::Arc;
use std::time::Duration;

use crate::config::WILDCARD;
use crate::limiter::TokenBucketLimiter;

/// A target pattern and the limiter that throttles matching requests.
#[derive(Debug)]
pub struct EndpointLimitRule {
    pattern: String,
    limit: u32,
    window: Duration,
    limiter: Arc<TokenBucketLimiter>,
}

impl EndpointLimitRule {
    /// Create a rule and its limiter. Must be called inside a Tokio runtime.
    pub fn new(pattern: impl Into<String>, limit: u32, window: Duration) -> Self {
        let pattern = pattern.into();
        let limiter = TokenBucketLimiter::new(pattern.clone(), limit, limit, window);
        Self {
            pattern,
            limit,
            window,
            limiter: Arc::new(limiter),
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn limiter(&self) -> &Arc<TokenBucketLimiter> {
        &self.limiter
    }

    /// Whether the pattern ends in the wildcard marker.
    pub fn is_prefix(&self) -> bool {
        self.pattern.ends_with(WILDCARD)
    }

    /// Prefix patterns match any target that starts with the literal prefix;
    /// exact patterns match the whole target, ignoring ASCII case.
    pub fn matches(&self, target: &str) -> bool {
        match self.pattern.strip_suffix(WILDCARD) {
            Some(prefix) => target.starts_with(prefix),
            None => self.pattern.eq_ignore_ascii_case(target),
        }
    }
}
