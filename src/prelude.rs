//! # Prelude
//!
//! Re-exports commonly used types and traits.
//!
//! ```rust
//! use table_provisioner::prelude::*;
//! ```

pub use crate::config::{LogFormat, ProvisionerConfig};

pub use crate::template::{resources_of_type, ResourceDeclaration, Template, TemplateError};

pub use crate::reconciler::{
    plan_tables, resolve_table_name, ConsoleObserver, OutcomeObserver, PlannedTable,
    ProvisionFailed, ProvisionOutcome, ProvisionReport, Reconciler, TableOutcome, TableSpec,
};

pub use crate::store::{DynamoDbStore, Item, StoreError, TableStore};

pub use crate::seed::{SeedBatch, SeedError, Seeder};
