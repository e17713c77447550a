//! HTTP transport configuration

use serde::{Deserialize, Serialize};

/// Settings applied to every client the transport builds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Total request timeout per attempt
    pub timeout_seconds: u64,
    /// TCP/TLS connect timeout per attempt
    pub connect_timeout_seconds: u64,
    /// Value of the User-Agent header
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            connect_timeout_seconds: 10,
            user_agent: format!("rotor/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}
