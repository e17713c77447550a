//! Config command handlers

use crate::cli::{ConfigInitArgs, ConfigValidateArgs};
use crate::config::RotorConfig;
use std::fs;

const EXAMPLE_CONFIG: &str = include_str!("../../rotor.example.toml");

/// Handle `rotor config init` command
pub fn handle_config_init(args: &ConfigInitArgs) -> anyhow::Result<()> {
    if args.output.exists() && !args.force {
        anyhow::bail!(
            "File already exists: {}. Use --force to overwrite.",
            args.output.display()
        );
    }

    fs::write(&args.output, EXAMPLE_CONFIG)?;

    println!("✓ Configuration file created: {}", args.output.display());
    println!("  Edit the [[proxies]] and [[endpoints]] tables to match your setup.");

    Ok(())
}

/// Handle `rotor config validate` command
///
/// Unlike other commands, a missing file is an error here.
pub fn handle_config_validate(args: &ConfigValidateArgs) -> anyhow::Result<String> {
    let config = RotorConfig::load(Some(&args.config))?.with_env_overrides();
    config.validate()?;

    Ok(format!(
        "✓ {} is valid: {} proxies, {} endpoint rules",
        args.config.display(),
        config.proxies.len(),
        config.endpoints.len()
    ))
}
