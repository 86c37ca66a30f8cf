//! Metrics collection and exposition.
//!
//! # Metrics
//! - `txflow_builds_total` (counter): builds by kind, outcome
//! - `txflow_sends_total` (counter): sends by kind, outcome
//! - `txflow_consolidations_total` (counter): completed consolidations
//! - `txflow_consolidation_transactions_total` (counter): sweep entries sent
//! - `txflow_bridge_requests_total` (counter): bridge requests by method, outcome
//! - `txflow_node_failures_total` (counter): failed node calls by node index

use std::net::SocketAddr;

use metrics::counter;
use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_build(kind: &'static str, outcome: &'static str) {
    counter!("txflow_builds_total", "kind" => kind, "outcome" => outcome).increment(1);
}

pub fn record_send(kind: &'static str, outcome: &'static str) {
    counter!("txflow_sends_total", "kind" => kind, "outcome" => outcome).increment(1);
}

pub fn record_consolidation(transactions: usize) {
    counter!("txflow_consolidations_total").increment(1);
    counter!("txflow_consolidation_transactions_total").increment(transactions as u64);
}

pub fn record_bridge_request(method: &'static str, outcome: &'static str) {
    counter!("txflow_bridge_requests_total", "method" => method, "outcome" => outcome).increment(1);
}

pub fn record_node_failure(node_idx: usize) {
    counter!("txflow_node_failures_total", "node" => node_idx.to_string()).increment(1);
}
