//! Configuration hot-reload settings

use serde::{Deserialize, Serialize};

/// Controls the config file watcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReloadConfig {
    /// Whether the watcher runs at all
    pub enabled: bool,
    /// Seconds between modification-time checks
    pub interval_seconds: u64,
}

impl Default for ReloadConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_seconds: 5,
        }
    }
}
