//! Endpoint (target URL pattern) rate limit configuration

use serde::{Deserialize, Serialize};

use crate::config::error::ConfigError;

/// Trailing marker that turns a pattern into a prefix match.
pub const WILDCARD: char = '*';

/// A rate limit applied to every request whose target matches `pattern`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointRuleConfig {
    /// Exact target (case-insensitive) or literal prefix ending in `*`
    pub pattern: String,
    /// Permits per window
    pub limit: i32,
    /// Replenishment window in seconds
    #[serde(alias = "windowSeconds")]
    pub window_seconds: i64,
}

impl EndpointRuleConfig {
    pub fn new(pattern: impl Into<String>, limit: i32, window_seconds: i64) -> Self {
        Self {
            pattern: pattern.into(),
            limit,
            window_seconds,
        }
    }
}

/// Reject patterns that can never match the way the author intended.
pub(crate) fn validate_pattern(index: usize, pattern: &str) -> Result<(), ConfigError> {
    let field = format!("endpoints[{}].pattern", index);

    if pattern.trim().is_empty() {
        return Err(ConfigError::Validation {
            field,
            message: "pattern cannot be empty".to_string(),
        });
    }

    let body = pattern.strip_suffix(WILDCARD).unwrap_or(pattern);
    if body.contains(WILDCARD) {
        return Err(ConfigError::Validation {
            field,
            message: format!(
                "wildcard '{}' is only supported at the end of a pattern: {}",
                WILDCARD, pattern
            ),
        });
    }

    Ok(())
}
