//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define breaker metrics (calls, rejections, retries, transitions)
//! - Expose a Prometheus-compatible metrics endpoint
//! - Track everything per breaker name
//!
//! # Metrics
//! - `breaker_calls_total` (counter): completed calls by breaker, outcome
//! - `breaker_call_duration_seconds` (histogram): time spent across all attempts
//! - `breaker_rejections_total` (counter): fail-fast rejections by breaker, phase
//! - `breaker_retries_total` (counter): retried attempts by breaker
//! - `breaker_transitions_total` (counter): phase changes by breaker, from, to
//! - `breaker_phase` (gauge): 0=closed, 1=half_open, 2=open
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed recorder
//!   every call is a no-op, so library users pay nothing by default
//! - Labels are breaker name plus low-cardinality enums only

use std::net::SocketAddr;
use std::time::Duration;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

use crate::resilience::state::Phase;

/// Install the Prometheus exporter with an HTTP listener on `addr`.
///
/// Must be called from within a tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Install a Prometheus recorder without a listener and return its handle.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

pub fn record_call(breaker: &str, outcome: &'static str, elapsed: Duration) {
    counter!("breaker_calls_total", "breaker" => breaker.to_string(), "outcome" => outcome).increment(1);
    histogram!("breaker_call_duration_seconds", "breaker" => breaker.to_string()).record(elapsed.as_secs_f64());
}

pub fn record_rejection(breaker: &str, phase: Phase) {
    counter!("breaker_rejections_total", "breaker" => breaker.to_string(), "phase" => phase.as_str()).increment(1);
}

pub fn record_retry(breaker: &str) {
    counter!("breaker_retries_total", "breaker" => breaker.to_string()).increment(1);
}

pub fn record_transition(breaker: &str, from: Phase, to: Phase) {
    counter!(
        "breaker_transitions_total",
        "breaker" => breaker.to_string(),
        "from" => from.as_str(),
        "to" => to.as_str()
    )
    .increment(1);
    record_phase(breaker, to);
}

pub fn record_phase(breaker: &str, phase: Phase) {
    gauge!("breaker_phase", "breaker" => breaker.to_string()).set(phase.as_gauge());
}
