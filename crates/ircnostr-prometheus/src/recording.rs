// SPDX-FileCopyrightText: 2026 ircnostr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade, so calls are no-ops until a recorder is
//! installed.

use ircnostr_core::types::DecisionReason;
use metrics::{describe_counter, describe_gauge, describe_histogram};

/// Register all ircnostr metric descriptions.
///
/// Called once at startup after the recorder is installed.
pub fn register_metrics() {
    describe_counter!(
        "ircnostr_messages_observed_total",
        "Chat lines seen on the connection"
    );
    describe_counter!(
        "ircnostr_relay_decisions_total",
        "Filter verdicts by reason"
    );
    describe_counter!(
        "ircnostr_publishes_total",
        "Fan-out publishes by result (delivered or failed)"
    );
    describe_counter!(
        "ircnostr_endpoint_results_total",
        "Per-relay delivery results"
    );
    describe_gauge!(
        "ircnostr_connection_registered",
        "1 while registered with the chat server"
    );
    describe_histogram!(
        "ircnostr_publish_duration_seconds",
        "Wall time of one fan-out publish"
    );
}

pub fn record_observed() {
    metrics::counter!("ircnostr_messages_observed_total").increment(1);
}

pub fn record_decision(reason: DecisionReason) {
    metrics::counter!("ircnostr_relay_decisions_total", "reason" => reason.to_string())
        .increment(1);
}

/// Record one fan-out publish; `delivered` means at least one relay accepted.
pub fn record_publish(delivered: bool, seconds: f64) {
    let result = if delivered { "delivered" } else { "failed" };
    metrics::counter!("ircnostr_publishes_total", "result" => result).increment(1);
    metrics::histogram!("ircnostr_publish_duration_seconds").record(seconds);
}

pub fn record_endpoint_result(success: bool) {
    let result = if success { "success" } else { "failure" };
    metrics::counter!("ircnostr_endpoint_results_total", "result" => result).increment(1);
}

pub fn set_connection_registered(registered: bool) {
    metrics::gauge!("ircnostr_connection_registered").set(if registered { 1.0 } else { 0.0 });
}
