// SPDX-FileCopyrightText: 2026 Filewise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Goes through the `metrics` facade; whichever recorder the host installs
//! collects these.

use metrics::{describe_counter, describe_gauge, describe_histogram};

/// Register all Filewise metric descriptions.
pub fn register_metrics() {
    describe_counter!(
        "filewise_operations_total",
        "Engine operations by name and outcome"
    );
    describe_counter!(
        "filewise_interactions_total",
        "Recorded interactions by event kind"
    );
    describe_counter!(
        "filewise_recommendation_feedback_total",
        "Accepted and rejected recommendations"
    );
    describe_gauge!("filewise_history_size", "Events held in the global history");
    describe_gauge!("filewise_indexed_files", "Files held in the vector store");
    describe_histogram!(
        "filewise_operation_latency_seconds",
        "Engine operation latency in seconds"
    );
}

/// Record one finished operation.
pub fn record_operation(operation: &'static str, outcome: &'static str, seconds: f64) {
    metrics::counter!("filewise_operations_total", "operation" => operation, "outcome" => outcome)
        .increment(1);
    metrics::histogram!("filewise_operation_latency_seconds", "operation" => operation)
        .record(seconds);
}

pub fn record_interaction(kind: &str) {
    metrics::counter!("filewise_interactions_total", "kind" => kind.to_string()).increment(1);
}

pub fn record_feedback(accepted: bool) {
    let outcome = if accepted { "accepted" } else { "rejected" };
    metrics::counter!("filewise_recommendation_feedback_total", "outcome" => outcome).increment(1);
}

pub fn set_history_size(events: usize) {
    metrics::gauge!("filewise_history_size").set(events as f64);
}

pub fn set_indexed_files(files: usize) {
    metrics::gauge!("filewise_indexed_files").set(files as f64);
}
