//! Config command implementation.

use crate::core::config::Config;
use anyhow::Result;
use clap::{Args, Subcommand};
use std::path::Path;

/// Config file read when `--config` is not given, if present.
pub const DEFAULT_CONFIG_PATH: &str = "config/beacon.toml";

/// Configuration operations.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Validate the configuration file.
    Validate,
    /// Print configuration with defaults applied.
    Show {
        /// Output format (toml, json).
        #[arg(long, default_value = "toml")]
        format: String,
    },
}

/// Load configuration.
///
/// An explicit path must exist. Without one, the default path is used when
/// present and built-in defaults otherwise.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::from_file(path),
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_PATH);
            if default_path.exists() {
                Config::from_file(default_path)
            } else {
                Ok(Config::default())
            }
        }
    }
}

/// Run the config command.
pub fn run_config(config_path: Option<&Path>, args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommand::Validate => validate_config(config_path),
        ConfigCommand::Show { format } => show_config(config_path, &format),
    }
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = load_config(path)?;
    println!("✓ Configuration is valid");
    println!("  discovery: {}", config.discovery.bind);
    println!("  admin:     {}", config.admin.bind);
    println!(
        "  service:   {} (every {}s)",
        config.reconcile.service_name, config.reconcile.interval_seconds
    );
    println!("  seeds:     {}", config.registry.endpoints.len());
    Ok(())
}

fn show_config(path: Option<&Path>, format: &str) -> Result<()> {
    let config = load_config(path)?;
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&config)?),
        "toml" => print!("{}", config.to_toml()?),
        other => anyhow::bail!("unknown format {:?}, expected toml or json", other),
    }
    Ok(())
}
