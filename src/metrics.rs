//! Metrics for the reconciliation loop.
//!
//! Uses the `metrics` facade only; installing an exporter is left to the
//! process embedding the library.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use std::time::Duration;

/// Metrics collector labeled with the connector name
#[derive(Debug, Clone)]
pub struct ReconcileMetrics {
    connector_name: String,
}

impl ReconcileMetrics {
    pub fn new(connector_name: impl Into<String>) -> Self {
        Self::register_metrics();

        Self {
            connector_name: connector_name.into(),
        }
    }

    fn register_metrics() {
        describe_counter!(
            "kafka_connect_sink_ticks_total",
            "Total number of reconciliation ticks"
        );
        describe_counter!(
            "kafka_connect_sink_upserts_total",
            "Total number of successful connector configuration upserts"
        );
        describe_counter!(
            "kafka_connect_sink_failures_total",
            "Total number of failed ticks, by stage"
        );
        describe_gauge!(
            "kafka_connect_sink_applied_topics",
            "Number of topics in the last applied configuration"
        );
        describe_histogram!(
            "kafka_connect_sink_reconcile_duration_seconds",
            "Time spent in ticks that issued an upsert"
        );
    }

    pub fn record_tick(&self) {
        counter!(
            "kafka_connect_sink_ticks_total",
            "connector" => self.connector_name.clone(),
        )
        .increment(1);
    }

    pub fn record_upsert(&self, applied_topics: usize) {
        counter!(
            "kafka_connect_sink_upserts_total",
            "connector" => self.connector_name.clone(),
        )
        .increment(1);
        self.set_applied_topics(applied_topics);
    }

    /// Record a failed tick; `stage` is `discovery` or `upsert`
    pub fn record_failure(&self, stage: &'static str) {
        counter!(
            "kafka_connect_sink_failures_total",
            "connector" => self.connector_name.clone(),
            "stage" => stage,
        )
        .increment(1);
    }

    pub fn set_applied_topics(&self, count: usize) {
        gauge!(
            "kafka_connect_sink_applied_topics",
            "connector" => self.connector_name.clone(),
        )
        .set(count as f64);
    }

    pub fn record_reconcile_time(&self, duration: Duration) {
        histogram!(
            "kafka_connect_sink_reconcile_duration_seconds",
            "connector" => self.connector_name.clone(),
        )
        .record(duration.as_secs_f64());
    }
}
