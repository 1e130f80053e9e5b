//! Beacon - unified CLI entrypoint.
//!
//! Usage:
//!   beacon start [--config config/beacon.toml] [--port 8080] [--http-bind :5000]
//!   beacon config validate --config config/beacon.toml
//!   beacon config show --format json

use anyhow::Result;
use beacon::cli::commands::{run_config, run_start};
use beacon::cli::{Cli, Commands};
use clap::Parser;
use std::path::PathBuf;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.map(PathBuf::from);

    match cli.command {
        Commands::Start(args) => run_start(config_path.as_deref(), cli.log_level, args).await,
        Commands::Config(args) => run_config(config_path.as_deref(), args),
    }
}
