//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_upstream_attempts_total` (counter): upstream attempts by `outcome`
//! - `relay_upstream_duration_seconds` (histogram): per-attempt latency
//! - `relay_generation_errors_total` (counter): failed generations by `kind`
//! - `relay_circuit_open` (gauge): 1 while the breaker is open
//! - `relay_parse_fallbacks_total` (counter): responses no parse strategy could decode
//! - `relay_requests_total` (counter): HTTP responses by `endpoint` and `status`
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::resilience::ErrorKind;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_attempt(outcome: &'static str, elapsed: Duration) {
    counter!("relay_upstream_attempts_total", "outcome" => outcome).increment(1);
    histogram!("relay_upstream_duration_seconds").record(elapsed.as_secs_f64());
}

pub fn record_generation_error(kind: ErrorKind) {
    counter!("relay_generation_errors_total", "kind" => kind.as_str()).increment(1);
}

pub fn set_circuit_open(open: bool) {
    gauge!("relay_circuit_open").set(if open { 1.0 } else { 0.0 });
}

pub fn record_parse_fallback() {
    counter!("relay_parse_fallbacks_total").increment(1);
}

pub fn record_request(endpoint: &'static str, status: u16) {
    counter!(
        "relay_requests_total",
        "endpoint" => endpoint,
        "status" => status.to_string()
    )
    .increment(1);
}
