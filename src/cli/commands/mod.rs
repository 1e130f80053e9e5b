//! CLI command implementations.

mod config;
mod start;

pub use config::{load_config, run_config, ConfigArgs, ConfigCommand, DEFAULT_CONFIG_PATH};
pub use start::{run_start, StartArgs};
