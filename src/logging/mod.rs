//! Structured logging setup
//!
//! Builds the `tracing` filter from [`LoggingConfig`] and installs a pretty
//! or JSON subscriber. Log output goes to stderr so command output on stdout
//! stays machine-readable.

mod request_id;

pub use request_id::generate_request_id;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, LoggingConfig};

/// Build filter directives string from LoggingConfig
///
/// Produces the base level followed by one `rotor::<component>=<level>`
/// directive per component override.
///
/// # Examples
///
/// ```
/// use rotor::config::LoggingConfig;
/// use rotor::logging::build_filter_directives;
///
/// let mut config = LoggingConfig::default();
/// config
///     .component_levels
///     .insert("rotation".to_string(), "debug".to_string());
///
/// assert_eq!(build_filter_directives(&config), "info,rotor::rotation=debug");
/// ```
pub fn build_filter_directives(config: &LoggingConfig) -> String {
    let mut filter_str = config.level.clone();

    for (component, level) in &config.component_levels {
        filter_str.push_str(&format!(",rotor::{}={}", component, level));
    }

    filter_str
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG`, when set, takes precedence over the configured levels. Fails
/// if a global subscriber is already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter_str = build_filter_directives(config);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    match config.format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .compact()
                        .with_writer(std::io::stderr),
                )
                .try_init()?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_current_span(true)
                        .with_writer(std::io::stderr),
                )
                .try_init()?;
        }
    }

    Ok(())
}
