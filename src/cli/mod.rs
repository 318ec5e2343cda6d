//! # Commands
//!
//! One module per subcommand.

use anyhow::{Context, Result};
use std::path::Path;
use table_provisioner::observability::metrics;
use tracing::info;

pub mod plan;
pub mod provision;
pub mod seed;

/// Write the Prometheus text exposition of all metrics to a file
pub fn write_metrics_file(path: &Path) -> Result<()> {
    let rendered = metrics::render_metrics()?;
    std::fs::write(path, rendered)
        .with_context(|| format!("Failed to write metrics file {}", path.display()))?;
    info!(path = %path.display(), "Metrics written");
    Ok(())
}
