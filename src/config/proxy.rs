//! Proxy (egress path) configuration

use serde::{Deserialize, Serialize};

/// One configured egress proxy.
///
/// `limit` and `window_seconds` override the top-level defaults for this
/// proxy only. A proxy without a usable limit gets no limiter at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Proxy URL, e.g. `http://10.0.0.5:3128` or `socks5://127.0.0.1:1080`
    pub address: String,
    /// Permits per window for this proxy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i32>,
    /// Replenishment window in seconds
    #[serde(
        default,
        alias = "windowSeconds",
        skip_serializing_if = "Option::is_none"
    )]
    pub window_seconds: Option<i64>,
}

impl ProxyConfig {
    /// Create a proxy entry without its own limit.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            limit: None,
            window_seconds: None,
        }
    }

    /// Set a per-proxy limit and window.
    pub fn with_limit(mut self, limit: i32, window_seconds: i64) -> Self {
        self.limit = Some(limit);
        self.window_seconds = Some(window_seconds);
        self
    }

    /// Effective limit and window, falling back to the pool-wide defaults.
    pub fn effective_limit(
        &self,
        default_limit: Option<i32>,
        default_window_seconds: Option<i64>,
    ) -> (Option<i32>, Option<i64>) {
        (
            self.limit.or(default_limit),
            self.window_seconds.or(default_window_seconds),
        )
    }
}
