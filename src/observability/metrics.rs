//! Metrics collection and exposition.
//!
//! # Metrics
//! - `router_requests_total` (counter): requests by method, route, status
//! - `router_request_duration_seconds` (histogram): latency distribution
//! - `router_backend_health` (gauge): 1=healthy, 0=unhealthy, per backend

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram, Label};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, route: &'static str, status: u16, start: Instant) {
    let labels = vec![
        Label::new("method", method.to_string()),
        Label::new("route", route),
        Label::new("status", status.to_string()),
    ];
    counter!("router_requests_total", labels.clone()).increment(1);
    histogram!("router_request_duration_seconds", labels).record(start.elapsed().as_secs_f64());
}

pub fn record_backend_health(backend: &str, healthy: bool) {
    gauge!("router_backend_health", "backend" => backend.to_string())
        .set(if healthy { 1.0 } else { 0.0 });
}
