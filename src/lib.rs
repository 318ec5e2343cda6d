//! Table Provisioner Library
//!
//! Reads a CloudFormation/SAM template, selects its DynamoDB table declarations
//! and creates each table against a (local) DynamoDB endpoint under an
//! environment-qualified name. Re-running is safe: existing tables are reported,
//! not recreated.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use table_provisioner::prelude::*;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = ProvisionerConfig::from_env();
//! let template = Template::from_path(&config.template_path)?;
//! let store = Arc::new(DynamoDbStore::new(&config).await);
//! let report = Reconciler::new(store, &config.stack_name)
//!     .reconcile(&template, &mut ConsoleObserver)
//!     .await;
//! assert!(!report.has_failures());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod observability;
pub mod prelude;
pub mod reconciler;
pub mod seed;
pub mod store;
pub mod template;
