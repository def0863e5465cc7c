//! Metrics collection and exposition.
//!
//! # Metrics
//! - `lb_requests_total` (counter): data-plane responses by status
//! - `lb_request_duration_seconds` (histogram): data-plane latency
//! - `lb_dispatch_failures_total` (counter): failed dispatches by kind
//! - `lb_registrations_total` (counter): accepted registrations
//! - `lb_evictions_total` (counter): backends removed by eviction sweeps
//! - `lb_pool_size` (gauge): registered backends
//!
//! Without an installed recorder every call here is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its HTTP scrape endpoint.
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => {
            tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter")
        }
    }
}

pub fn record_request(status: u16, start: Instant) {
    metrics::counter!("lb_requests_total", "status" => status.to_string()).increment(1);
    metrics::histogram!("lb_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_dispatch_failure(kind: &'static str) {
    metrics::counter!("lb_dispatch_failures_total", "kind" => kind).increment(1);
}

pub fn record_registration() {
    metrics::counter!("lb_registrations_total").increment(1);
}

pub fn record_eviction(removed: usize) {
    metrics::counter!("lb_evictions_total").increment(removed as u64);
}

pub fn record_pool_size(size: usize) {
    metrics::gauge!("lb_pool_size").set(size as f64);
}
