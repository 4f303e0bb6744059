//! Config command implementation.
//!
//! Inspects the effective configuration and writes the initial file.

use std::path::PathBuf;

use crate::cli::{Cli, ConfigAction, ConfigArgs};
use crate::config::{default_config_path, Config};
use crate::error::{ArborError, Result};

/// Run the config command.
pub fn run(cli: &Cli, conf: &Config, args: &ConfigArgs) -> Result<()> {
    match &args.action {
        ConfigAction::Show => show_config(conf),
        ConfigAction::Path => show_config_path(cli),
        ConfigAction::Init => init_config(cli),
    }
}

/// Print the effective configuration as TOML.
fn show_config(conf: &Config) -> Result<()> {
    let rendered = toml::to_string_pretty(conf).map_err(|e| ArborError::InvalidConfig {
        message: format!("Failed to serialize config: {e}"),
    })?;
    print!("{rendered}");
    Ok(())
}

/// Print the configuration file path.
fn show_config_path(cli: &Cli) -> Result<()> {
    let path = config_path(cli)?;
    println!("{}", path.display());
    Ok(())
}

/// Write a configuration file with defaults, unless one already exists.
fn init_config(cli: &Cli) -> Result<()> {
    let path = config_path(cli)?;

    if path.exists() {
        println!("Configuration file already exists at: {}", path.display());
        return Ok(());
    }

    Config::default().save_to(&path)?;
    println!("Created configuration file at: {}", path.display());
    Ok(())
}

/// The explicitly chosen config path, or the platform default.
fn config_path(cli: &Cli) -> Result<PathBuf> {
    match &cli.config {
        Some(path) => Ok(path.clone()),
        None => default_config_path(),
    }
}
