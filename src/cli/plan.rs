//! # Plan Command
//!
//! Prints what `provision` would create, without calling DynamoDB.

use anyhow::{Context, Result};
use colored::Colorize;
use table_provisioner::config::ProvisionerConfig;
use table_provisioner::reconciler::plan_tables;
use table_provisioner::template::Template;

pub fn plan_command(config: &ProvisionerConfig) -> Result<()> {
    let template = Template::from_path(&config.template_path).with_context(|| {
        format!(
            "Failed to load template {}",
            config.template_path.display()
        )
    })?;

    let planned = plan_tables(&template, &config.stack_name);
    if planned.is_empty() {
        println!("No AWS::DynamoDB::Table resources found.");
        return Ok(());
    }

    println!("\n{:<30} {:<40}", "LOGICAL NAME", "TABLE NAME");
    println!("{}", "-".repeat(70));
    for table in &planned {
        println!("{:<30} {:<40}", table.logical_name, table.table_name.bold());
        match &table.spec {
            Ok(spec) => {
                let rendered = serde_json::to_string_pretty(spec)
                    .context("Failed to render table spec")?;
                for line in rendered.lines() {
                    println!("    {line}");
                }
            }
            Err(e) => println!("    {} {e}", "✖".red()),
        }
    }
    Ok(())
}
