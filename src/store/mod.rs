//! # Table Stores
//!
//! The seam between the reconciler and the key-value store.
//!
//! `dynamodb` implements [`TableStore`] on the official AWS SDK; tests plug in
//! an in-memory implementation.

use crate::reconciler::schema::TableSpec;
use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

pub mod attribute_value;
pub mod dynamodb;

pub use dynamodb::DynamoDbStore;

/// An item in DynamoDB JSON form (`{"id": {"S": "1"}, "count": {"N": "3"}}`)
pub type Item = Map<String, Value>;

/// Store-side failures, split into the recognized conflict and everything else
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The table already exists (DynamoDB `ResourceInUseException`)
    #[error("Table {0} already exists")]
    AlreadyExists(String),
    /// Any other rejection; carries the store's message verbatim
    #[error("{0}")]
    Rejected(String),
}

/// Store trait for table provisioning and item seeding
///
/// Calls are issued one at a time by the reconciler; implementations do not
/// need to handle concurrent use beyond being `Send + Sync`.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Create a table
    ///
    /// Must return `StoreError::AlreadyExists` when the table is already present,
    /// so that re-running a provisioning pass is safe.
    async fn create_table(&self, table_name: &str, spec: &TableSpec) -> Result<(), StoreError>;

    /// Put a batch of items into a table
    ///
    /// Returns the items the store did not process; callers retry those.
    async fn batch_write(&self, table_name: &str, items: &[Item]) -> Result<Vec<Item>, StoreError>;
}
