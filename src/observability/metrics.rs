//! # Metrics
//!
//! Prometheus metrics for a provisioning run.
//!
//! ## Metrics Exposed
//!
//! - `table_provisioner_tables_created_total` - Tables created by this process
//! - `table_provisioner_tables_existing_total` - Tables that already existed
//! - `table_provisioner_table_failures_total` - Tables the store rejected
//! - `table_provisioner_create_table_duration_seconds` - Duration of create-table calls
//! - `table_provisioner_items_seeded_total` - Items written by the seeder, by table
//!
//! The provisioner is one-shot, so there is no scrape endpoint: `render_metrics`
//! produces the text exposition format for a node-exporter textfile collector.

use anyhow::Result;
use prometheus::{Encoder, Histogram, IntCounter, IntCounterVec, Registry, TextEncoder};
use std::sync::LazyLock;

pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static TABLES_CREATED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "table_provisioner_tables_created_total",
        "Total number of tables created",
    )
    .expect("Failed to create TABLES_CREATED_TOTAL metric - this should never happen")
});

static TABLES_EXISTING_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "table_provisioner_tables_existing_total",
        "Total number of tables that already existed",
    )
    .expect("Failed to create TABLES_EXISTING_TOTAL metric - this should never happen")
});

static TABLE_FAILURES_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "table_provisioner_table_failures_total",
        "Total number of tables that could not be provisioned",
    )
    .expect("Failed to create TABLE_FAILURES_TOTAL metric - this should never happen")
});

static CREATE_TABLE_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "table_provisioner_create_table_duration_seconds",
            "Duration of create-table requests in seconds",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
    )
    .expect("Failed to create CREATE_TABLE_DURATION metric - this should never happen")
});

static ITEMS_SEEDED_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "table_provisioner_items_seeded_total",
            "Total number of items written by the seeder",
        ),
        &["table"],
    )
    .expect("Failed to create ITEMS_SEEDED_TOTAL metric - this should never happen")
});

/// Register all metrics with the process registry
///
/// Must be called at most once per process.
pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(TABLES_CREATED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(TABLES_EXISTING_TOTAL.clone()))?;
    REGISTRY.register(Box::new(TABLE_FAILURES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(CREATE_TABLE_DURATION.clone()))?;
    REGISTRY.register(Box::new(ITEMS_SEEDED_TOTAL.clone()))?;

    Ok(())
}

pub fn increment_tables_created() {
    TABLES_CREATED_TOTAL.inc();
}

pub fn increment_tables_existing() {
    TABLES_EXISTING_TOTAL.inc();
}

pub fn increment_table_failures() {
    TABLE_FAILURES_TOTAL.inc();
}

pub fn observe_create_table_duration(duration: f64) {
    CREATE_TABLE_DURATION.observe(duration);
}

pub fn increment_items_seeded(table: &str, count: usize) {
    ITEMS_SEEDED_TOTAL
        .with_label_values(&[table])
        .inc_by(count as u64);
}

/// Render all registered metrics in the Prometheus text format
pub fn render_metrics() -> Result<String> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&REGISTRY.gather(), &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increment_tables_created() {
        let before = TABLES_CREATED_TOTAL.get();
        increment_tables_created();
        assert_eq!(TABLES_CREATED_TOTAL.get(), before + 1);
    }

    #[test]
    fn test_increment_tables_existing() {
        let before = TABLES_EXISTING_TOTAL.get();
        increment_tables_existing();
        assert_eq!(TABLES_EXISTING_TOTAL.get(), before + 1);
    }

    #[test]
    fn test_increment_table_failures() {
        let before = TABLE_FAILURES_TOTAL.get();
        increment_table_failures();
        assert_eq!(TABLE_FAILURES_TOTAL.get(), before + 1);
    }

    #[test]
    fn test_observe_create_table_duration() {
        let before = CREATE_TABLE_DURATION.get_sample_count();
        observe_create_table_duration(0.02);
        assert_eq!(CREATE_TABLE_DURATION.get_sample_count(), before + 1);
    }

    #[test]
    fn test_increment_items_seeded_by_table() {
        let before = ITEMS_SEEDED_TOTAL.with_label_values(&["events-local"]).get();
        increment_items_seeded("events-local", 25);
        let after = ITEMS_SEEDED_TOTAL.with_label_values(&["events-local"]).get();
        assert_eq!(after, before + 25);
    }
}
