//! Metrics collection.
//!
//! # Metrics
//! - `resilient_client_attempts_total` (counter): attempts by outcome
//! - `resilient_client_rejected_total` (counter): calls refused by an open circuit
//! - `resilient_client_circuit_transitions_total` (counter): breaker transitions by target state
//! - `resilient_client_health_probes_total` (counter): probes by result
//! - `resilient_client_online` (gauge): 1=online, 0=offline
//!
//! Emitted through the `metrics` facade; without an installed recorder these are no-ops.

use crate::resilience::circuit_breaker::CircuitBreakerState;

pub fn record_attempt(outcome: &'static str) {
    metrics::counter!("resilient_client_attempts_total", "outcome" => outcome).increment(1);
}

pub fn record_rejected() {
    metrics::counter!("resilient_client_rejected_total").increment(1);
}

pub fn record_circuit_transition(to: CircuitBreakerState) {
    metrics::counter!("resilient_client_circuit_transitions_total", "to" => to.as_str()).increment(1);
}

pub fn record_health_probe(healthy: bool) {
    let result = if healthy { "success" } else { "failure" };
    metrics::counter!("resilient_client_health_probes_total", "result" => result).increment(1);
}

pub fn record_online(online: bool) {
    metrics::gauge!("resilient_client_online").set(if online { 1.0 } else { 0.0 });
}
