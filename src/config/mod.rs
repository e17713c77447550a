//! Configuration module for Rotor
//!
//! A [`RotorConfig`] is an immutable snapshot: the proxy list, the pool-wide
//! default limit, and the endpoint rules. Swapping in a new snapshot rebuilds
//! the proxy pool and the endpoint registry wholesale.
//!
//! # Configuration Precedence
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`ROTOR_*`)
//! 3. Configuration file (TOML)
//! 4. Default values (lowest priority)
//!
//! # Example
//!
//! ```rust
//! use rotor::config::RotorConfig;
//!
//! let toml = r#"
//! default_proxy_limit = 10
//! default_proxy_window_seconds = 1
//!
//! [[proxies]]
//! address = "http://10.0.0.1:3128"
//!
//! [[endpoints]]
//! pattern = "https://api.example.com/*"
//! limit = 5
//! window_seconds = 1
//! "#;
//! let config: RotorConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.proxies.len(), 1);
//! assert_eq!(config.endpoints[0].limit, 5);
//! ```

pub mod endpoint;
pub mod error;
pub mod logging;
pub mod proxy;
pub mod reload;
pub mod transport;

pub use endpoint::{EndpointRuleConfig, WILDCARD};
pub use error::ConfigError;
pub use logging::{LogFormat, LoggingConfig};
pub use proxy::ProxyConfig;
pub use reload::ReloadConfig;
pub use transport::TransportConfig;

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Unified configuration snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RotorConfig {
    /// Limit for the synthetic direct path, and for proxies without their own
    #[serde(alias = "defaultProxyLimit", skip_serializing_if = "Option::is_none")]
    pub default_proxy_limit: Option<i32>,
    /// Window paired with `default_proxy_limit`
    #[serde(
        alias = "defaultProxyWindowSeconds",
        skip_serializing_if = "Option::is_none"
    )]
    pub default_proxy_window_seconds: Option<i64>,
    /// Egress proxies; empty means "send direct"
    pub proxies: Vec<ProxyConfig>,
    /// Target-pattern rate limits
    pub endpoints: Vec<EndpointRuleConfig>,
    /// HTTP client settings
    pub transport: TransportConfig,
    /// Config file watching
    pub reload: ReloadConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl RotorConfig {
    /// Load configuration from a TOML file
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p)?;
                Self::parse(&content)
            }
            None => Ok(Self::default()),
        }
    }

    /// Parse configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply environment variable overrides
    ///
    /// Invalid values are ignored and the file/default value is kept.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(level) = std::env::var("ROTOR_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("ROTOR_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }

        if let Ok(limit) = std::env::var("ROTOR_DEFAULT_PROXY_LIMIT") {
            if let Ok(l) = limit.parse() {
                self.default_proxy_limit = Some(l);
            }
        }
        if let Ok(window) = std::env::var("ROTOR_DEFAULT_PROXY_WINDOW_SECONDS") {
            if let Ok(w) = window.parse() {
                self.default_proxy_window_seconds = Some(w);
            }
        }

        if let Ok(timeout) = std::env::var("ROTOR_TIMEOUT_SECONDS") {
            if let Ok(t) = timeout.parse() {
                self.transport.timeout_seconds = t;
            }
        }

        self
    }

    /// Validate configuration
    ///
    /// Non-positive limits are not errors: they simply mean "no limiter".
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (i, rule) in self.endpoints.iter().enumerate() {
            endpoint::validate_pattern(i, &rule.pattern)?;
        }

        if self.transport.timeout_seconds == 0 {
            return Err(ConfigError::Validation {
                field: "transport.timeout_seconds".to_string(),
                message: "timeout must be non-zero".to_string(),
            });
        }

        if self.reload.enabled && self.reload.interval_seconds == 0 {
            return Err(ConfigError::Validation {
                field: "reload.interval_seconds".to_string(),
                message: "interval must be non-zero when reload is enabled".to_string(),
            });
        }

        Ok(())
    }
}
