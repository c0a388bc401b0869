//! Prometheus metrics for the proof endpoint
//!
//! Only outcome labels; transaction hashes are never recorded.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

pub const OUTCOME_OK: &str = "ok";

pub fn record_proof_request(outcome: &'static str, duration: Duration) {
    counter!("proof_requests_total", "outcome" => outcome).increment(1);
    histogram!("proof_request_duration_seconds", "outcome" => outcome).record(duration.as_secs_f64());
}

pub fn record_proof_request_start() {
    gauge!("proof_requests_in_flight").increment(1.0);
}

pub fn record_proof_request_end() {
    gauge!("proof_requests_in_flight").decrement(1.0);
}

pub fn set_chain_height(height: u64) {
    gauge!("fuego_chain_height").set(height as f64);
}

/// Install the process-wide recorder; fails if one is already installed
pub fn init_prometheus_recorder() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}
