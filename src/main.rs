//! # Table Provisioner
//!
//! Creates the DynamoDB tables declared in a CloudFormation/SAM template against
//! a local DynamoDB endpoint, so a development stack starts with the same tables
//! the deployed stack has.
//!
//! ## Usage
//!
//! ```bash
//! # Provision every AWS::DynamoDB::Table in ./template.yaml (the default command)
//! table-provisioner
//!
//! # Another template, stack name and endpoint
//! table-provisioner provision --template infra/template.yaml --stack-name dev --endpoint http://localhost:8000
//!
//! # Show resolved names and schemas without touching DynamoDB
//! table-provisioner plan
//!
//! # Load batch-write JSON files into provisioned tables
//! table-provisioner seed data/events.json data/users.json
//! ```
//!
//! Settings come from environment variables (and `.env`); flags override them.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use table_provisioner::config::ProvisionerConfig;
use table_provisioner::observability::{logging, metrics};
use tracing::{debug, info, warn};

mod cli;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("BUILD_GIT_HASH"),
    ", built ",
    env!("BUILD_DATETIME"),
    ")"
);

/// Provision DynamoDB tables declared in a CloudFormation/SAM template
#[derive(Parser)]
#[command(name = "table-provisioner", version, long_version = LONG_VERSION)]
#[command(
    about = "Provision DynamoDB tables declared in a CloudFormation/SAM template",
    long_about = None,
    after_help = "\
Environment:
  DYNAMODB_ENDPOINT  DynamoDB endpoint (default: http://dynamodb:8000)
  AWS_REGION         Region for the SDK client (default: eu-north-1)
  STACK_NAME         Qualifier appended to table names (default: local)
  TEMPLATE_PATH      Template file (default: template.yaml)
  ALLOW_FAILURES     Exit 0 even when tables failed (default: false)
  LOG_LEVEL          ERROR, WARN, INFO, DEBUG or TRACE (default: INFO)
  LOG_FORMAT         text or json (default: text)
"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Template file to read
    #[arg(short, long, global = true)]
    template: Option<PathBuf>,

    /// Qualifier appended to every table name
    #[arg(short, long, global = true)]
    stack_name: Option<String>,

    /// DynamoDB endpoint URL
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// AWS region for the SDK client
    #[arg(long, global = true)]
    region: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create every table declared in the template (default)
    Provision {
        /// Exit successfully even when some tables failed
        #[arg(long)]
        allow_failures: bool,

        /// Write Prometheus metrics in text format to this file when done
        #[arg(long, value_name = "PATH")]
        metrics_file: Option<PathBuf>,
    },
    /// Print resolved table names and schemas without calling DynamoDB
    Plan,
    /// Load batch-write JSON files into tables
    Seed {
        /// Seed files (`{"table": [{"PutRequest": {"Item": {...}}}]}`)
        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,

        /// Write Prometheus metrics in text format to this file when done
        #[arg(long, value_name = "PATH")]
        metrics_file: Option<PathBuf>,
    },
}

impl Cli {
    /// Apply command-line overrides on top of the environment configuration
    fn apply_overrides(&self, config: &mut ProvisionerConfig) {
        if let Some(template) = &self.template {
            config.template_path.clone_from(template);
        }
        if let Some(stack_name) = &self.stack_name {
            config.stack_name.clone_from(stack_name);
        }
        if let Some(endpoint) = &self.endpoint {
            config.endpoint.clone_from(endpoint);
        }
        if let Some(region) = &self.region {
            config.region.clone_from(region);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before reading configuration; a missing file is fine
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();
    let mut config = ProvisionerConfig::from_env();
    cli.apply_overrides(&mut config);

    logging::init_tracing(&config)?;
    match dotenv {
        Ok(path) => debug!(path = %path.display(), "Loaded .env file"),
        Err(e) if e.not_found() => {}
        Err(e) => warn!(error = %e, "Failed to load .env file"),
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        build_datetime = env!("BUILD_DATETIME"),
        git_hash = env!("BUILD_GIT_HASH"),
        "Starting table-provisioner"
    );
    debug!(config = ?config, "Configuration loaded");

    metrics::register_metrics()?;

    match cli.command.unwrap_or(Commands::Provision {
        allow_failures: false,
        metrics_file: None,
    }) {
        Commands::Provision {
            allow_failures,
            metrics_file,
        } => {
            if allow_failures {
                config.allow_failures = true;
            }
            cli::provision::provision_command(&config, metrics_file.as_deref()).await
        }
        Commands::Plan => cli::plan::plan_command(&config),
        Commands::Seed {
            files,
            metrics_file,
        } => cli::seed::seed_command(&config, &files, metrics_file.as_deref()).await,
    }
}
