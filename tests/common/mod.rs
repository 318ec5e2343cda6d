//! Common test utilities
//!
//! An in-memory [`TableStore`] that records every call, plus an observer that
//! collects status lines.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use table_provisioner::prelude::*;

/// One recorded store call
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    CreateTable(String),
    BatchWrite { table: String, items: usize },
}

/// In-memory store
///
/// Tables persist across passes, so a second pass sees `AlreadyExists`.
#[derive(Debug, Default)]
pub struct InMemoryTableStore {
    tables: Mutex<HashMap<String, TableSpec>>,
    items: Mutex<HashMap<String, Vec<Item>>>,
    calls: Mutex<Vec<StoreCall>>,
    rejections: Mutex<HashMap<String, String>>,
    unprocessed_rounds: Mutex<VecDeque<usize>>,
    failing_writes: Mutex<HashSet<String>>,
}

impl InMemoryTableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject create-table calls for `table` with `reason`
    pub fn reject(self, table: &str, reason: &str) -> Self {
        self.rejections
            .lock()
            .unwrap()
            .insert(table.to_string(), reason.to_string());
        self
    }

    /// Pre-create a table
    pub fn with_table(self, table: &str) -> Self {
        self.tables
            .lock()
            .unwrap()
            .insert(table.to_string(), TableSpec::default());
        self
    }

    /// For each upcoming batch write, leave this many trailing items unprocessed
    pub fn with_unprocessed_rounds(self, rounds: &[usize]) -> Self {
        self.unprocessed_rounds.lock().unwrap().extend(rounds);
        self
    }

    /// Fail every batch write to `table`
    pub fn fail_writes_to(self, table: &str) -> Self {
        self.failing_writes.lock().unwrap().insert(table.to_string());
        self
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn created_tables(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                StoreCall::CreateTable(name) => Some(name),
                StoreCall::BatchWrite { .. } => None,
            })
            .collect()
    }

    pub fn table_spec(&self, table: &str) -> Option<TableSpec> {
        self.tables.lock().unwrap().get(table).cloned()
    }

    pub fn items(&self, table: &str) -> Vec<Item> {
        self.items
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl TableStore for InMemoryTableStore {
    async fn create_table(&self, table_name: &str, spec: &TableSpec) -> Result<(), StoreError> {
        self.calls
            .lock()
            .unwrap()
            .push(StoreCall::CreateTable(table_name.to_string()));

        if let Some(reason) = self.rejections.lock().unwrap().get(table_name) {
            return Err(StoreError::Rejected(reason.clone()));
        }

        let mut tables = self.tables.lock().unwrap();
        if tables.contains_key(table_name) {
            return Err(StoreError::AlreadyExists(table_name.to_string()));
        }
        tables.insert(table_name.to_string(), spec.clone());
        Ok(())
    }

    async fn batch_write(&self, table_name: &str, items: &[Item]) -> Result<Vec<Item>, StoreError> {
        self.calls.lock().unwrap().push(StoreCall::BatchWrite {
            table: table_name.to_string(),
            items: items.len(),
        });

        if self.failing_writes.lock().unwrap().contains(table_name) {
            return Err(StoreError::Rejected(format!(
                "Requested resource not found: {table_name}"
            )));
        }

        let keep_back = self
            .unprocessed_rounds
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(0)
            .min(items.len());
        let (written, unprocessed) = items.split_at(items.len() - keep_back);

        self.items
            .lock()
            .unwrap()
            .entry(table_name.to_string())
            .or_default()
            .extend_from_slice(written);
        Ok(unprocessed.to_vec())
    }
}

/// Collects status lines and the final report
#[derive(Debug, Default)]
pub struct RecordingObserver {
    pub lines: Vec<String>,
    pub completed: Option<ProvisionReport>,
}

impl OutcomeObserver for RecordingObserver {
    fn on_outcome(&mut self, outcome: &TableOutcome) {
        self.lines.push(outcome.status_line());
    }

    fn on_complete(&mut self, report: &ProvisionReport) {
        self.completed = Some(report.clone());
    }
}
