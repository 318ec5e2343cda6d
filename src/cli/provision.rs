//! # Provision Command
//!
//! Creates every table declared in the template.

use super::write_metrics_file;
use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;
use table_provisioner::config::ProvisionerConfig;
use table_provisioner::reconciler::{ConsoleObserver, Reconciler};
use table_provisioner::store::DynamoDbStore;
use table_provisioner::template::Template;
use tracing::info;

/// Provision all tables, then apply the exit policy
///
/// A template that cannot be loaded aborts before any table is touched. Table
/// failures are reported per table; the command fails afterwards unless
/// failures are allowed.
pub async fn provision_command(config: &ProvisionerConfig, metrics_file: Option<&Path>) -> Result<()> {
    let template = Template::from_path(&config.template_path).with_context(|| {
        format!(
            "Failed to load template {}",
            config.template_path.display()
        )
    })?;

    info!(
        endpoint = config.endpoint.as_str(),
        region = config.region.as_str(),
        stack_name = config.stack_name.as_str(),
        "Using DynamoDB endpoint"
    );
    println!(
        "Provisioning tables from {} against {} (stack: {})",
        config.template_path.display().to_string().bold(),
        config.endpoint.as_str().bold(),
        config.stack_name.as_str().bold()
    );

    let store = Arc::new(DynamoDbStore::new(config).await);
    let reconciler = Reconciler::new(store, config.stack_name.as_str());
    let report = reconciler.reconcile(&template, &mut ConsoleObserver).await;

    if let Some(path) = metrics_file {
        write_metrics_file(path)?;
    }

    report.exit_result(config.allow_failures)?;
    Ok(())
}
