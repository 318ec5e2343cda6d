//! # Provisioning
//!
//! Issues one create-table call per planned table, strictly in declaration
//! order, and classifies every result. A failing table never stops the pass:
//! the outcome is recorded and the next table is attempted.

use super::{plan_tables, PlannedTable};
use crate::observability::metrics;
use crate::store::{StoreError, TableStore};
use crate::template::Template;
use colored::Colorize;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{info, info_span, warn, Instrument};

/// Result of provisioning one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionOutcome {
    Created,
    AlreadyExists,
    /// Any other failure, with the reason reported by the store
    Failed(String),
}

impl ProvisionOutcome {
    /// Classify the result of a create-table call
    #[must_use]
    pub fn from_store_result(result: Result<(), StoreError>) -> Self {
        match result {
            Ok(()) => ProvisionOutcome::Created,
            Err(StoreError::AlreadyExists(_)) => ProvisionOutcome::AlreadyExists,
            Err(StoreError::Rejected(reason)) => ProvisionOutcome::Failed(reason),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ProvisionOutcome::Created => "created",
            ProvisionOutcome::AlreadyExists => "already_exists",
            ProvisionOutcome::Failed(_) => "failed",
        }
    }
}

/// Outcome for one table, with the names it was provisioned under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableOutcome {
    pub logical_name: String,
    pub table_name: String,
    pub outcome: ProvisionOutcome,
}

impl TableOutcome {
    /// Marker symbol shown in front of the status line
    #[must_use]
    pub fn marker(&self) -> &'static str {
        match self.outcome {
            ProvisionOutcome::Created => "✔",
            ProvisionOutcome::AlreadyExists => "•",
            ProvisionOutcome::Failed(_) => "✖",
        }
    }

    /// Status text without the marker, e.g. `events-local created`
    #[must_use]
    pub fn status_text(&self) -> String {
        match &self.outcome {
            ProvisionOutcome::Created => format!("{} created", self.table_name),
            ProvisionOutcome::AlreadyExists => format!("{} already exists", self.table_name),
            ProvisionOutcome::Failed(reason) => format!("{} failed: {reason}", self.table_name),
        }
    }

    /// Uncolored status line
    #[must_use]
    pub fn status_line(&self) -> String {
        format!("{} {}", self.marker(), self.status_text())
    }
}

/// Outcomes of one provisioning pass, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionReport {
    pub outcomes: Vec<TableOutcome>,
}

impl ProvisionReport {
    fn count(&self, predicate: impl Fn(&ProvisionOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| predicate(&o.outcome)).count()
    }

    pub fn created(&self) -> usize {
        self.count(|o| *o == ProvisionOutcome::Created)
    }

    pub fn already_existing(&self) -> usize {
        self.count(|o| *o == ProvisionOutcome::AlreadyExists)
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, ProvisionOutcome::Failed(_)))
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    /// Exit policy: any failed table fails the run unless failures are allowed
    pub fn exit_result(&self, allow_failures: bool) -> Result<(), ProvisionFailed> {
        if self.has_failures() && !allow_failures {
            return Err(ProvisionFailed {
                failed: self.failed(),
                total: self.outcomes.len(),
            });
        }
        Ok(())
    }

    /// Completion line printed after the last table
    #[must_use]
    pub fn summary_line(&self) -> String {
        format!(
            "All tables processed ({} created, {} already existed, {} failed)",
            self.created(),
            self.already_existing(),
            self.failed()
        )
    }
}

/// A pass ended with failed tables and failures were not allowed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{failed} of {total} table(s) failed to provision")]
pub struct ProvisionFailed {
    pub failed: usize,
    pub total: usize,
}

/// Receives outcomes as they happen
pub trait OutcomeObserver {
    fn on_outcome(&mut self, outcome: &TableOutcome);

    /// Called once after the last table, also when there were no tables
    fn on_complete(&mut self, report: &ProvisionReport);
}

/// Prints one colored status line per table to stdout
#[derive(Debug, Default)]
pub struct ConsoleObserver;

impl OutcomeObserver for ConsoleObserver {
    fn on_outcome(&mut self, outcome: &TableOutcome) {
        let marker = match outcome.outcome {
            ProvisionOutcome::Created => outcome.marker().green(),
            ProvisionOutcome::AlreadyExists => outcome.marker().bright_black(),
            ProvisionOutcome::Failed(_) => outcome.marker().red(),
        };
        println!(" {marker} {}", outcome.status_text());
    }

    fn on_complete(&mut self, report: &ProvisionReport) {
        let marker = if report.has_failures() {
            "✖".red()
        } else {
            "✔".green()
        };
        println!(" {marker} {}", report.summary_line().bold());
    }
}

/// Provisions the tables of a template against a store
pub struct Reconciler {
    store: Arc<dyn TableStore>,
    qualifier: String,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("qualifier", &self.qualifier)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    pub fn new(store: Arc<dyn TableStore>, qualifier: impl Into<String>) -> Self {
        Self {
            store,
            qualifier: qualifier.into(),
        }
    }

    /// Names and schemas that a pass would use, without calling the store
    pub fn plan(&self, template: &Template) -> Vec<PlannedTable> {
        plan_tables(template, &self.qualifier)
    }

    /// Run one provisioning pass
    ///
    /// Store calls are awaited one after another; the next table is not
    /// attempted before the previous outcome is known.
    pub async fn reconcile(
        &self,
        template: &Template,
        observer: &mut dyn OutcomeObserver,
    ) -> ProvisionReport {
        let planned = self.plan(template);
        info!(
            stack_name = self.qualifier.as_str(),
            tables = planned.len(),
            "Provisioning tables"
        );

        let mut report = ProvisionReport::default();
        for table in planned {
            let outcome = TableOutcome {
                outcome: self.provision_table(&table).await,
                logical_name: table.logical_name,
                table_name: table.table_name,
            };
            observer.on_outcome(&outcome);
            report.outcomes.push(outcome);
        }

        info!(
            created = report.created(),
            already_existing = report.already_existing(),
            failed = report.failed(),
            "Provisioning pass complete"
        );
        observer.on_complete(&report);
        report
    }

    async fn provision_table(&self, table: &PlannedTable) -> ProvisionOutcome {
        let span = info_span!(
            "reconciler.table.provision",
            table.name = table.table_name.as_str(),
            logical_name = table.logical_name.as_str()
        );

        async move {
            let outcome = match &table.spec {
                Ok(spec) => {
                    let start = Instant::now();
                    let result = self.store.create_table(&table.table_name, spec).await;
                    metrics::observe_create_table_duration(start.elapsed().as_secs_f64());
                    ProvisionOutcome::from_store_result(result)
                }
                Err(e) => ProvisionOutcome::Failed(e.to_string()),
            };

            match &outcome {
                ProvisionOutcome::Created => {
                    metrics::increment_tables_created();
                    info!(outcome = outcome.as_str(), "Table created");
                }
                ProvisionOutcome::AlreadyExists => {
                    metrics::increment_tables_existing();
                    info!(outcome = outcome.as_str(), "Table already exists");
                }
                ProvisionOutcome::Failed(reason) => {
                    metrics::increment_table_failures();
                    warn!(
                        outcome = outcome.as_str(),
                        error = reason.as_str(),
                        "Table provisioning failed"
                    );
                }
            }
            outcome
        }
        .instrument(span)
        .await
    }
}
