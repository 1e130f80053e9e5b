//! Start command implementation.

use super::config::load_config;
use crate::core::config::ConfigOverrides;
use crate::core::runtime::Runtime;
use anyhow::Result;
use clap::Args;
use std::path::Path;

/// Start the discovery and admin servers.
#[derive(Args, Debug, Default)]
pub struct StartArgs {
    /// EDS gRPC listener port.
    #[arg(long)]
    pub port: Option<u16>,

    /// Admin HTTP bind address (e.g. ":5000" or "127.0.0.1:5000").
    #[arg(long)]
    pub http_bind: Option<String>,

    /// Service (Envoy cluster) name.
    #[arg(long)]
    pub service_name: Option<String>,

    /// Seconds between reconciliation ticks.
    #[arg(long)]
    pub interval_seconds: Option<u64>,

    /// Endpoint to register at startup; repeatable.
    #[arg(long)]
    pub endpoint: Vec<String>,
}

impl StartArgs {
    /// Overrides to apply on top of the loaded configuration.
    pub fn overrides(&self, log_level: Option<String>) -> ConfigOverrides {
        ConfigOverrides {
            log_level,
            discovery_port: self.port,
            admin_bind: self.http_bind.clone(),
            service_name: self.service_name.clone(),
            interval_seconds: self.interval_seconds,
            endpoints: self.endpoint.clone(),
        }
    }
}

/// Initialize tracing subscriber if the telemetry feature is enabled.
///
/// `RUST_LOG` takes precedence over the configured level.
#[cfg(feature = "telemetry")]
fn init_tracing(log_level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();
}

#[cfg(not(feature = "telemetry"))]
fn init_tracing(_log_level: &str) {}

/// Run the start command.
pub async fn run_start(
    config_path: Option<&Path>,
    log_level: Option<String>,
    args: StartArgs,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    config.apply_overrides(&args.overrides(log_level));
    config.validate()?;

    init_tracing(&config.telemetry.log_level);

    let mut runtime = Runtime::new(config)?;
    runtime.run().await
}
