//! # Seed Command
//!
//! Loads batch-write JSON files into tables, one file after another.

use super::write_metrics_file;
use anyhow::{Context, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use table_provisioner::config::ProvisionerConfig;
use table_provisioner::seed::Seeder;
use table_provisioner::store::DynamoDbStore;

pub async fn seed_command(
    config: &ProvisionerConfig,
    files: &[PathBuf],
    metrics_file: Option<&Path>,
) -> Result<()> {
    let store = Arc::new(DynamoDbStore::new(config).await);
    let seeder = Seeder::new(store);

    for file in files {
        let written = seeder
            .seed_file(file)
            .await
            .with_context(|| format!("Failed to seed {}", file.display()))?;
        for (table, count) in written {
            println!(
                " {} {table}: {count} item(s) from {}",
                "✔".green(),
                file.display()
            );
        }
    }

    if let Some(path) = metrics_file {
        write_metrics_file(path)?;
    }
    Ok(())
}
