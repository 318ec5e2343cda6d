//! # Seeding
//!
//! Loads batch-write JSON files into provisioned tables.
//!
//! File format (the `RequestItems` shape of `BatchWriteItem`):
//!
//! ```json
//! {
//!   "event-table-local": [
//!     { "PutRequest": { "Item": { "id": { "S": "1" } } } }
//!   ]
//! }
//! ```
//!
//! Items are written in chunks of [`BATCH_WRITE_MAX_ITEMS`]. Items the store
//! leaves unprocessed are retried with exponential backoff.

use crate::constants::{BATCH_WRITE_MAX_ATTEMPTS, BATCH_WRITE_MAX_ITEMS, BATCH_WRITE_RETRY_BASE_MS};
use crate::observability::metrics;
use crate::store::{Item, StoreError, TableStore};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, info_span, warn, Instrument};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Failed to read seed file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Seed file {} is not valid JSON: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Seed file {}: {message}", path.display())]
    Format { path: PathBuf, message: String },
    #[error("Batch write to {table} failed: {source}")]
    Store {
        table: String,
        #[source]
        source: StoreError,
    },
    #[error("{remaining} item(s) for {table} still unprocessed after {attempts} attempts")]
    Unprocessed {
        table: String,
        remaining: usize,
        attempts: u32,
    },
}

/// Items destined for one table
#[derive(Debug, Clone, PartialEq)]
pub struct SeedBatch {
    pub table_name: String,
    pub items: Vec<Item>,
}

/// Parse a batch-write document
///
/// Only `PutRequest` entries are accepted; a `DeleteRequest` or any other
/// shape is a format error.
pub fn parse_seed_document(document: &Value) -> Result<Vec<SeedBatch>, String> {
    let tables = document
        .as_object()
        .ok_or_else(|| "top level must be an object keyed by table name".to_string())?;

    tables
        .iter()
        .map(|(table_name, requests)| {
            let requests = requests
                .as_array()
                .ok_or_else(|| format!("requests for {table_name} must be an array"))?;
            let items = requests
                .iter()
                .enumerate()
                .map(|(index, request)| {
                    put_request_item(request)
                        .ok_or_else(|| format!("{table_name}[{index}] is not a PutRequest with an Item"))
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(SeedBatch {
                table_name: table_name.clone(),
                items,
            })
        })
        .collect()
}

fn put_request_item(request: &Value) -> Option<Item> {
    let request = request.as_object()?;
    if request.len() != 1 {
        return None;
    }
    request
        .get("PutRequest")?
        .get("Item")?
        .as_object()
        .cloned()
}

/// Read and parse a seed file
pub fn load_seed_file(path: &Path) -> Result<Vec<SeedBatch>, SeedError> {
    let text = std::fs::read_to_string(path).map_err(|source| SeedError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let document: Value = serde_json::from_str(&text).map_err(|source| SeedError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    parse_seed_document(&document).map_err(|message| SeedError::Format {
        path: path.to_path_buf(),
        message,
    })
}

/// Writes seed batches through a [`TableStore`]
pub struct Seeder {
    store: Arc<dyn TableStore>,
    retry_base: Duration,
    max_attempts: u32,
}

impl std::fmt::Debug for Seeder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Seeder")
            .field("retry_base", &self.retry_base)
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}

impl Seeder {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self {
            store,
            retry_base: Duration::from_millis(BATCH_WRITE_RETRY_BASE_MS),
            max_attempts: BATCH_WRITE_MAX_ATTEMPTS,
        }
    }

    /// Override the retry schedule
    #[must_use]
    pub fn with_retry(mut self, retry_base: Duration, max_attempts: u32) -> Self {
        self.retry_base = retry_base;
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Seed every table listed in a file; returns `(table, items written)` per batch
    pub async fn seed_file(&self, path: &Path) -> Result<Vec<(String, usize)>, SeedError> {
        let batches = load_seed_file(path)?;
        let span = info_span!("seed.file", path = %path.display(), tables = batches.len());
        async move {
            let mut written = Vec::with_capacity(batches.len());
            for batch in &batches {
                let count = self.seed_batch(batch).await?;
                written.push((batch.table_name.clone(), count));
            }
            Ok(written)
        }
        .instrument(span)
        .await
    }

    /// Seed one table; returns the number of items written
    pub async fn seed_batch(&self, batch: &SeedBatch) -> Result<usize, SeedError> {
        if batch.items.is_empty() {
            debug!(table = batch.table_name.as_str(), "No items to seed");
            return Ok(0);
        }

        for chunk in batch.items.chunks(BATCH_WRITE_MAX_ITEMS) {
            self.write_chunk(&batch.table_name, chunk).await?;
            metrics::increment_items_seeded(&batch.table_name, chunk.len());
        }

        info!(
            table = batch.table_name.as_str(),
            items = batch.items.len(),
            "Seeded table"
        );
        Ok(batch.items.len())
    }

    async fn write_chunk(&self, table: &str, chunk: &[Item]) -> Result<(), SeedError> {
        let mut pending = chunk.to_vec();
        for attempt in 0..self.max_attempts {
            pending = self
                .store
                .batch_write(table, &pending)
                .await
                .map_err(|source| SeedError::Store {
                    table: table.to_string(),
                    source,
                })?;
            if pending.is_empty() {
                return Ok(());
            }

            let delay = self.retry_base.saturating_mul(2u32.saturating_pow(attempt));
            warn!(
                table,
                unprocessed = pending.len(),
                attempt = attempt + 1,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "Retrying unprocessed items"
            );
            tokio::time::sleep(delay).await;
        }

        Err(SeedError::Unprocessed {
            table: table.to_string(),
            remaining: pending.len(),
            attempts: self.max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_put_requests() {
        let batches = parse_seed_document(&json!({
            "events-local": [
                {"PutRequest": {"Item": {"id": {"S": "1"}}}},
                {"PutRequest": {"Item": {"id": {"S": "2"}}}}
            ],
            "users-local": []
        }))
        .unwrap();

        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].table_name, "events-local");
        assert_eq!(batches[0].items.len(), 2);
        assert_eq!(batches[0].items[1]["id"], json!({"S": "2"}));
        assert!(batches[1].items.is_empty());
    }

    #[test]
    fn test_delete_requests_are_rejected() {
        let err = parse_seed_document(&json!({
            "events-local": [{"DeleteRequest": {"Key": {"id": {"S": "1"}}}}]
        }))
        .unwrap_err();
        assert_eq!(err, "events-local[0] is not a PutRequest with an Item");
    }

    #[test]
    fn test_malformed_documents() {
        assert!(parse_seed_document(&json!([])).is_err());
        assert!(parse_seed_document(&json!({"t": {}})).is_err());
        assert!(parse_seed_document(&json!({"t": [{"PutRequest": {}}]})).is_err());
        assert!(parse_seed_document(&json!({"t": [{"PutRequest": {"Item": 1}}]})).is_err());
    }

    #[test]
    fn test_load_seed_file_errors() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("missing.json");
        assert!(matches!(load_seed_file(&missing), Err(SeedError::Io { .. })));

        let invalid = dir.path().join("invalid.json");
        std::fs::write(&invalid, "{not json").unwrap();
        assert!(matches!(load_seed_file(&invalid), Err(SeedError::Parse { .. })));

        let wrong = dir.path().join("wrong.json");
        std::fs::write(&wrong, "[1, 2]").unwrap();
        assert!(matches!(load_seed_file(&wrong), Err(SeedError::Format { .. })));
    }
}
