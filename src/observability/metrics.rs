//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): forwarded requests by method, status
//! - `proxy_request_duration_seconds` (histogram): end-to-end forwarding latency
//! - `proxy_token_fetches_total` (counter): token exchanges by outcome
//!
//! Recording is a no-op until an exporter is installed, so tests and
//! deployments without metrics pay nothing beyond the macro call.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter with an HTTP scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record a request handled by the forwarder, including token failures.
pub fn record_request(method: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
    ];
    ::metrics::counter!("proxy_requests_total", &labels).increment(1);
    ::metrics::histogram!("proxy_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}

/// Record the outcome of a token exchange.
pub fn record_token_fetch(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    ::metrics::counter!("proxy_token_fetches_total", "outcome" => outcome).increment(1);
}
