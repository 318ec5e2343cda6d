//! # Logging
//!
//! tracing subscriber setup. `RUST_LOG` takes precedence over the configured level.

use crate::config::{LogFormat, ProvisionerConfig};
use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Build the env filter for the configured level
///
/// Our own crate logs at the configured level; the SDK stack stays at `warn`
/// so request-level chatter does not drown the status output.
pub fn env_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = log_level.to_lowercase();
        EnvFilter::new(format!("warn,table_provisioner={level}"))
    })
}

/// Install the global tracing subscriber
pub fn init_tracing(config: &ProvisionerConfig) -> Result<()> {
    let filter = env_filter(&config.log_level);
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match config.log_format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    }
    .map_err(|e| anyhow!("Failed to initialize tracing subscriber: {e}"))
}
