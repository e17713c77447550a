//! CLI module for Rotor
//!
//! # Commands
//!
//! - `fetch` - Send requests through the rotating proxy pool
//! - `proxies` - Show the ranked proxy pool and endpoint rules
//! - `resolve` - Show which limits and proxies a target would use
//! - `config` - Configuration utilities (init, validate)
//! - `completions` - Generate shell completions
//!
//! # Example
//!
//! ```bash
//! # Fetch two URLs, four at a time, reloading rotor.toml on change
//! rotor fetch https://example.com/a https://example.com/b --concurrency 4 --watch
//!
//! # Inspect the pool as JSON
//! rotor proxies --json
//! ```

pub mod completions;
pub mod config;
pub mod fetch;
pub mod output;
pub mod proxies;
pub mod resolve;

pub use completions::handle_completions;
pub use config::{handle_config_init, handle_config_validate};

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::config::RotorConfig;

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG: &str = "rotor.toml";

/// Rotor - rate-limited rotating proxy client
#[derive(Parser, Debug)]
#[command(
    name = "rotor",
    version,
    about = "Rate-limited HTTP client rotating across a proxy pool"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send requests through the proxy pool
    Fetch(FetchArgs),
    /// Show the ranked proxy pool and endpoint rules
    Proxies(ProxiesArgs),
    /// Show which endpoint rule and proxy order apply to a URL
    Resolve(ResolveArgs),
    /// Configuration utilities
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Target URLs
    #[arg(required = true)]
    pub urls: Vec<String>,

    /// HTTP method
    #[arg(short = 'X', long, default_value = "GET")]
    pub method: String,

    /// Request header as 'Name: value' (repeatable)
    #[arg(short = 'H', long = "header")]
    pub headers: Vec<String>,

    /// Request body
    #[arg(short = 'd', long = "data")]
    pub data: Option<String>,

    /// Maximum number of requests in flight
    #[arg(long, default_value = "1")]
    pub concurrency: usize,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Reload the configuration file when it changes
    #[arg(long)]
    pub watch: bool,

    /// Print response bodies after the summary
    #[arg(long)]
    pub show_body: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "ROTOR_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Path to configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,
}

#[derive(Args, Debug)]
pub struct ProxiesArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Path to configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,
}

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Target URL to resolve
    pub url: String,

    /// Path to configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Initialize a new configuration file
    Init(ConfigInitArgs),
    /// Check a configuration file for errors
    Validate(ConfigValidateArgs),
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Output file path
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    pub output: PathBuf,

    /// Overwrite existing file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct ConfigValidateArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}

/// Load configuration for a command.
///
/// A missing file at `path` means defaults. Environment overrides are
/// applied on top, and the result is validated.
pub fn load_config(path: &Path) -> anyhow::Result<RotorConfig> {
    let config = if path.exists() {
        RotorConfig::load(Some(path))?
    } else {
        tracing::debug!(path = %path.display(), "Config file not found, using defaults");
        RotorConfig::default()
    };

    let config = config.with_env_overrides();
    config.validate()?;
    Ok(config)
}
