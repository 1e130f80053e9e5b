//! Configuration parsing and validation.
//!
//! Beacon configuration is loaded from TOML files with CLI overrides.
//! Every section has defaults, so an empty file is a valid configuration.

use crate::control::address::EndpointAddress;
use crate::control::reconcile::ReconcileConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

/// Top-level Beacon configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// EDS gRPC listener configuration.
    #[serde(default)]
    pub discovery: DiscoveryConfig,

    /// Admin HTTP listener configuration.
    #[serde(default)]
    pub admin: AdminConfig,

    /// Reconciliation loop configuration.
    #[serde(default)]
    pub reconcile: ReconcileSection,

    /// Endpoint registry seeding.
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Telemetry configuration.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// EDS gRPC listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_discovery_bind")]
    pub bind: String,

    /// HTTP/2 concurrent stream limit per connection.
    #[serde(default = "default_max_concurrent_streams")]
    pub max_concurrent_streams: u32,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            bind: default_discovery_bind(),
            max_concurrent_streams: default_max_concurrent_streams(),
        }
    }
}

/// Admin HTTP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Bind address (e.g., "0.0.0.0:5000").
    #[serde(default = "default_admin_bind")]
    pub bind: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            bind: default_admin_bind(),
        }
    }
}

/// Reconciliation loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileSection {
    /// Service (Envoy cluster) name carried in every snapshot.
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Seconds between reconciliation ticks.
    #[serde(default = "default_interval_seconds")]
    pub interval_seconds: u64,
}

impl Default for ReconcileSection {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            interval_seconds: default_interval_seconds(),
        }
    }
}

impl ReconcileSection {
    /// Loop settings for the reconciler.
    pub fn to_reconcile_config(&self) -> ReconcileConfig {
        ReconcileConfig {
            service_name: self.service_name.clone(),
            interval: Duration::from_secs(self.interval_seconds),
        }
    }
}

/// Endpoint registry seeding.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Endpoints registered at startup, as `host:port`.
    #[serde(default)]
    pub endpoints: Vec<String>,
}

/// Telemetry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_discovery_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_max_concurrent_streams() -> u32 {
    1_000_000
}

fn default_admin_bind() -> String {
    "0.0.0.0:5000".to_string()
}

fn default_service_name() -> String {
    "myservice".to_string()
}

fn default_interval_seconds() -> u64 {
    60
}

fn default_log_level() -> String {
    "debug".to_string()
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Config =
            toml::from_str(&content).with_context(|| "failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).with_context(|| "failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    /// Render the configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).with_context(|| "failed to serialize config")
    }

    /// Apply CLI overrides to the configuration.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(ref log_level) = overrides.log_level {
            self.telemetry.log_level = log_level.clone();
        }
        if let Some(port) = overrides.discovery_port {
            let host = self
                .discovery
                .bind
                .rsplit_once(':')
                .map(|(host, _)| host.to_string())
                .unwrap_or_else(|| "0.0.0.0".to_string());
            self.discovery.bind = format!("{}:{}", host, port);
        }
        if let Some(ref admin_bind) = overrides.admin_bind {
            self.admin.bind = normalize_bind(admin_bind);
        }
        if let Some(ref service_name) = overrides.service_name {
            self.reconcile.service_name = service_name.clone();
        }
        if let Some(interval_seconds) = overrides.interval_seconds {
            self.reconcile.interval_seconds = interval_seconds;
        }
        self.registry
            .endpoints
            .extend(overrides.endpoints.iter().cloned());
    }

    /// Validate configuration consistency.
    pub fn validate(&self) -> Result<()> {
        self.validate_listeners()?;
        self.validate_reconcile()?;
        self.validate_registry()?;
        self.validate_telemetry()?;
        Ok(())
    }

    /// Parsed EDS listener address.
    pub fn discovery_addr(&self) -> Result<SocketAddr> {
        parse_bind("discovery.bind", &self.discovery.bind)
    }

    /// Parsed admin listener address.
    pub fn admin_addr(&self) -> Result<SocketAddr> {
        parse_bind("admin.bind", &self.admin.bind)
    }

    /// Parsed seed endpoints.
    pub fn seed_endpoints(&self) -> Result<Vec<EndpointAddress>> {
        self.registry
            .endpoints
            .iter()
            .map(|raw| {
                EndpointAddress::parse(raw)
                    .with_context(|| format!("registry.endpoints entry {:?} is invalid", raw))
            })
            .collect()
    }

    fn validate_listeners(&self) -> Result<()> {
        let discovery = self.discovery_addr()?;
        let admin = self.admin_addr()?;
        if discovery == admin && discovery.port() != 0 {
            anyhow::bail!(
                "discovery.bind and admin.bind must differ, both are {}",
                discovery
            );
        }
        if self.discovery.max_concurrent_streams == 0 {
            anyhow::bail!("discovery.max_concurrent_streams must be > 0");
        }
        Ok(())
    }

    fn validate_reconcile(&self) -> Result<()> {
        if self.reconcile.service_name.trim().is_empty() {
            anyhow::bail!("reconcile.service_name must not be empty");
        }
        if self.reconcile.interval_seconds == 0 {
            anyhow::bail!("reconcile.interval_seconds must be > 0");
        }
        Ok(())
    }

    fn validate_registry(&self) -> Result<()> {
        self.seed_endpoints()?;
        Ok(())
    }

    fn validate_telemetry(&self) -> Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.telemetry.log_level.as_str()) {
            anyhow::bail!(
                "telemetry.log_level must be one of {:?}, got: {}",
                valid_levels,
                self.telemetry.log_level
            );
        }
        Ok(())
    }
}

fn parse_bind(field: &str, value: &str) -> Result<SocketAddr> {
    value
        .parse()
        .with_context(|| format!("{} is not a valid socket address: {}", field, value))
}

/// Accept the `:5000` shorthand for "all interfaces".
fn normalize_bind(bind: &str) -> String {
    if bind.starts_with(':') {
        format!("0.0.0.0{}", bind)
    } else {
        bind.to_string()
    }
}

/// CLI override options that can be applied to configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Override log level.
    pub log_level: Option<String>,
    /// Override the EDS listener port.
    pub discovery_port: Option<u16>,
    /// Override the admin bind address.
    pub admin_bind: Option<String>,
    /// Override the service name.
    pub service_name: Option<String>,
    /// Override the tick interval.
    pub interval_seconds: Option<u64>,
    /// Additional seed endpoints.
    pub endpoints: Vec<String>,
}
