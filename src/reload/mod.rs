//! Configuration hot reload
//!
//! [`ConfigWatcher`] polls the configuration file's modification time. When
//! it changes, the file is loaded, environment overrides are applied, and the
//! result is validated before the rotator swaps in new pools. An invalid file
//! is logged and ignored; the previous snapshot stays active.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, SystemTime};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::{ConfigError, RotorConfig};
use crate::rotation::Rotator;

/// Result of one reload check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// The file has not been modified since the last check.
    Unchanged,
    /// A new snapshot was installed.
    Applied { proxies: usize, rules: usize },
}

/// Watches a configuration file and applies changes to a [`Rotator`].
pub struct ConfigWatcher {
    path: PathBuf,
    rotator: Arc<Rotator>,
    interval: Duration,
    last_modified: Mutex<Option<SystemTime>>,
}

impl ConfigWatcher {
    /// Create a watcher. The file's current state is treated as already applied.
    pub fn new(path: impl Into<PathBuf>, rotator: Arc<Rotator>, interval: Duration) -> Self {
        let path = path.into();
        let last_modified = modified_time(&path).ok();
        Self {
            path,
            rotator,
            interval,
            last_modified: Mutex::new(last_modified),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reload if the file changed since the last check.
    ///
    /// A file that fails to load or validate is remembered as seen, so the
    /// same broken contents are reported once rather than on every tick.
    pub fn check_once(&self) -> Result<ReloadOutcome, ConfigError> {
        let modified = modified_time(&self.path)?;
        {
            let mut last = self
                .last_modified
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if *last == Some(modified) {
                return Ok(ReloadOutcome::Unchanged);
            }
            *last = Some(modified);
        }

        self.reload()
    }

    /// Load, validate and apply the file unconditionally.
    pub fn reload(&self) -> Result<ReloadOutcome, ConfigError> {
        let config = RotorConfig::load(Some(&self.path))?.with_env_overrides();
        config.validate()?;

        self.rotator.apply_config(&config);
        let outcome = ReloadOutcome::Applied {
            proxies: self.rotator.pool().len(),
            rules: self.rotator.endpoints().snapshot().len(),
        };
        tracing::info!(path = %self.path.display(), ?outcome, "Configuration reloaded");
        Ok(outcome)
    }

    /// Start the watcher background task.
    /// Returns a JoinHandle that resolves when the watcher stops.
    pub fn start(self, cancel_token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first tick completes immediately; the current file is already applied.
            interval.tick().await;

            tracing::info!(
                path = %self.path.display(),
                interval_seconds = self.interval.as_secs(),
                "Config watcher started"
            );

            loop {
                tokio::select! {
                    _ = cancel_token.cancelled() => {
                        tracing::info!("Config watcher shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        match self.check_once() {
                            Ok(ReloadOutcome::Unchanged) => {}
                            Ok(ReloadOutcome::Applied { .. }) => {}
                            Err(e) => {
                                tracing::warn!(
                                    path = %self.path.display(),
                                    error = %e,
                                    "Ignoring invalid configuration; keeping previous snapshot"
                                );
                            }
                        }
                    }
                }
            }
        })
    }
}

fn modified_time(path: &Path) -> Result<SystemTime, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }
    Ok(std::fs::metadata(path)?.modified()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::HttpTransport;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    const ONE_PROXY: &str = r#"
[[proxies]]
address = "http://a:1"
"#;

    const TWO_PROXIES_ONE_RULE: &str = r#"
[[proxies]]
address = "http://b:1"

[[proxies]]
address = "http://c:1"

[[endpoints]]
pattern = "https://api/*"
limit = 2
window_seconds = 1
"#;

    fn write_config(path: &Path, contents: &str, bump: u64) {
        let mut file = File::create(path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000 + bump))
            .unwrap();
    }

    fn watcher(dir: &TempDir) -> (ConfigWatcher, Arc<Rotator>) {
        let path = dir.path().join("rotor.toml");
        write_config(&path, ONE_PROXY, 0);
        let config = RotorConfig::load(Some(&path)).unwrap();
        let rotator = Arc::new(Rotator::new(&config, Arc::new(HttpTransport::default())));
        let watcher = ConfigWatcher::new(&path, Arc::clone(&rotator), Duration::from_secs(1));
        (watcher, rotator)
    }

    #[tokio::test]
    async fn test_unchanged_file_is_not_reapplied() {
        let dir = TempDir::new().unwrap();
        let (watcher, rotator) = watcher(&dir);

        assert_eq!(watcher.check_once().unwrap(), ReloadOutcome::Unchanged);
        assert_eq!(rotator.pool().generation(), 0);
    }

    #[tokio::test]
    async fn test_modified_file_is_applied() {
        let dir = TempDir::new().unwrap();
        let (watcher, rotator) = watcher(&dir);

        write_config(watcher.path(), TWO_PROXIES_ONE_RULE, 1);
        assert_eq!(
            watcher.check_once().unwrap(),
            ReloadOutcome::Applied {
                proxies: 2,
                rules: 1
            }
        );
        assert_eq!(rotator.ranked_proxies()[0].address(), Some("http://b:1"));
        assert!(rotator.limiter_for(Some("https://api/v1")).is_some());

        assert_eq!(watcher.check_once().unwrap(), ReloadOutcome::Unchanged);
    }

    #[tokio::test]
    async fn test_invalid_file_keeps_previous_snapshot() {
        let dir = TempDir::new().unwrap();
        let (watcher, rotator) = watcher(&dir);

        write_config(watcher.path(), "[[endpoints]]\npattern = \"a*b\"\nlimit = 1\nwindow_seconds = 1\n", 1);
        assert!(matches!(
            watcher.check_once(),
            Err(ConfigError::Validation { .. })
        ));
        assert_eq!(rotator.ranked_proxies()[0].address(), Some("http://a:1"));
        assert_eq!(rotator.pool().generation(), 0);

        // Same broken contents are not reported twice.
        assert_eq!(watcher.check_once().unwrap(), ReloadOutcome::Unchanged);

        write_config(watcher.path(), "not = [valid", 2);
        assert!(matches!(watcher.check_once(), Err(ConfigError::Parse(_))));
        assert_eq!(rotator.pool().generation(), 0);
    }

    #[tokio::test]
    async fn test_missing_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let (watcher, _rotator) = watcher(&dir);
        std::fs::remove_file(watcher.path()).unwrap();

        assert!(matches!(
            watcher.check_once(),
            Err(ConfigError::NotFound(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_task_applies_changes_and_stops() {
        let dir = TempDir::new().unwrap();
        let (watcher, rotator) = watcher(&dir);
        let path = watcher.path().to_path_buf();
        let cancel = CancellationToken::new();
        let handle = watcher.start(cancel.clone());

        write_config(&path, TWO_PROXIES_ONE_RULE, 1);
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(rotator.pool().len(), 2);

        cancel.cancel();
        handle.await.unwrap();
    }
}
