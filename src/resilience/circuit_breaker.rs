//! Circuit breaker guarding a single target.
//!
//! # States
//! - Closed: normal operation, requests pass through
//! - Open: target assumed down, requests fail fast
//! - Half-Open: one probe request tests whether the target recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: failure_count >= failure_threshold
//! Open → Half-Open: recovery timeout elapsed, on the next admission check
//! Half-Open → Closed: probe request succeeds
//! Half-Open → Open: probe request fails (opened_at reset)
//! ```
//!
//! # Design Decisions
//! - One breaker per client/target, never global
//! - Fail fast in Open state (no waiting for timeout)
//! - Single probe in Half-Open (prevents hammering recovering target)
//! - An abandoned probe returns its slot through `ProbeGuard`'s drop
//! - Every transition is a function of the current record and one event,
//!   applied under one lock, so interleaved callers never lose updates

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime};
use serde::Serialize;
use tokio::time::Instant;

use crate::config::CircuitBreakerConfig;
use crate::observability::metrics;

/// Breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitBreakerState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitBreakerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitBreakerState::Closed => "closed",
            CircuitBreakerState::Open => "open",
            CircuitBreakerState::HalfOpen => "half_open",
        }
    }
}

impl std::fmt::Display for CircuitBreakerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Circuit closed; call proceeds normally.
    Allowed,
    /// Caller holds the single half-open probe slot.
    Probe,
    Rejected,
}

/// Holds the half-open probe slot for one attempt.
///
/// Dropped while armed (the attempt future was cancelled or dropped), it hands
/// the slot back so the next caller can probe.
#[must_use = "dropping the guard immediately releases the probe slot"]
#[derive(Debug)]
pub struct ProbeGuard<'a> {
    breaker: &'a CircuitBreaker,
    armed: bool,
}

impl<'a> ProbeGuard<'a> {
    pub(crate) fn new(breaker: &'a CircuitBreaker) -> Self {
        Self { breaker, armed: true }
    }

    /// The attempt finished and its outcome will be recorded; keep the slot.
    pub fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for ProbeGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.breaker.release_probe();
            tracing::debug!("Half-open probe abandoned, slot released");
        }
    }
}

/// Read-only view of the breaker record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CircuitBreakerSnapshot {
    pub state: CircuitBreakerState,
    pub failure_count: u32,
    /// Wall-clock time of the most recent failure.
    pub last_failure_time: Option<SystemTime>,
}

#[derive(Debug)]
struct CircuitBreakerRecord {
    state: CircuitBreakerState,
    failure_count: u32,
    last_failure_time: Option<SystemTime>,
    opened_at: Option<Instant>,
    probe_in_flight: bool,
}

impl CircuitBreakerRecord {
    fn closed() -> Self {
        Self {
            state: CircuitBreakerState::Closed,
            failure_count: 0,
            last_failure_time: None,
            opened_at: None,
            probe_in_flight: false,
        }
    }
}

/// Thread-safe circuit breaker.
#[derive(Debug)]
pub struct CircuitBreaker {
    failure_threshold: u32,
    recovery_timeout: Duration,
    record: Mutex<CircuitBreakerRecord>,
}

impl CircuitBreaker {
    pub fn new(config: &CircuitBreakerConfig) -> Self {
        Self::with_settings(config.failure_threshold, config.recovery_timeout())
    }

    pub fn with_settings(failure_threshold: u32, recovery_timeout: Duration) -> Self {
        Self {
            failure_threshold: failure_threshold.max(1),
            recovery_timeout,
            record: Mutex::new(CircuitBreakerRecord::closed()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CircuitBreakerRecord> {
        self.record.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Decide whether a call may proceed.
    pub fn admit(&self) -> Admission {
        let mut record = self.lock();
        match record.state {
            CircuitBreakerState::Closed => Admission::Allowed,
            CircuitBreakerState::Open => {
                let elapsed = record
                    .opened_at
                    .map(|at| Instant::now().saturating_duration_since(at))
                    .unwrap_or(self.recovery_timeout);
                if elapsed >= self.recovery_timeout {
                    record.state = CircuitBreakerState::HalfOpen;
                    record.probe_in_flight = true;
                    drop(record);
                    tracing::info!("Circuit breaker half-open, admitting probe");
                    metrics::record_circuit_transition(CircuitBreakerState::HalfOpen);
                    Admission::Probe
                } else {
                    Admission::Rejected
                }
            }
            CircuitBreakerState::HalfOpen => {
                if record.probe_in_flight {
                    Admission::Rejected
                } else {
                    record.probe_in_flight = true;
                    Admission::Probe
                }
            }
        }
    }

    /// Like [`admit`](Self::admit), pairing a probe admission with a guard
    /// that frees the slot if the caller never records an outcome.
    pub fn admit_guarded(&self) -> (Admission, Option<ProbeGuard<'_>>) {
        let admission = self.admit();
        let guard = (admission == Admission::Probe).then(|| ProbeGuard::new(self));
        (admission, guard)
    }

    /// True if a call may proceed now.
    pub fn allow_request(&self) -> bool {
        self.admit() != Admission::Rejected
    }

    pub fn record_success(&self) {
        let mut record = self.lock();
        match record.state {
            CircuitBreakerState::HalfOpen => {
                record.state = CircuitBreakerState::Closed;
                record.probe_in_flight = false;
                record.failure_count = 0;
                record.opened_at = None;
                drop(record);
                tracing::info!("Circuit breaker closed after successful probe");
                metrics::record_circuit_transition(CircuitBreakerState::Closed);
            }
            CircuitBreakerState::Closed => record.failure_count = 0,
            // Late success from a call admitted before the circuit opened.
            CircuitBreakerState::Open => {}
        }
    }

    pub fn record_failure(&self) {
        let now = Instant::now();
        let mut record = self.lock();
        record.failure_count = record.failure_count.saturating_add(1);
        record.last_failure_time = Some(SystemTime::now());

        let opened = match record.state {
            CircuitBreakerState::HalfOpen => true,
            CircuitBreakerState::Closed => record.failure_count >= self.failure_threshold,
            CircuitBreakerState::Open => false,
        };
        if opened {
            let from = record.state;
            record.state = CircuitBreakerState::Open;
            record.opened_at = Some(now);
            record.probe_in_flight = false;
            let failures = record.failure_count;
            drop(record);
            tracing::warn!(
                from = %from,
                failures,
                recovery_timeout = ?self.recovery_timeout,
                "Circuit breaker opened"
            );
            metrics::record_circuit_transition(CircuitBreakerState::Open);
        }
    }

    /// Give back the half-open probe slot without judging the target.
    pub fn release_probe(&self) {
        let mut record = self.lock();
        if record.state == CircuitBreakerState::HalfOpen {
            record.probe_in_flight = false;
        }
    }

    pub fn state(&self) -> CircuitBreakerState {
        self.lock().state
    }

    pub fn failure_count(&self) -> u32 {
        self.lock().failure_count
    }

    /// Monotonic time the circuit last opened.
    pub fn opened_at(&self) -> Option<Instant> {
        self.lock().opened_at
    }

    pub fn snapshot(&self) -> CircuitBreakerSnapshot {
        let record = self.lock();
        CircuitBreakerSnapshot {
            state: record.state,
            failure_count: record.failure_count,
            last_failure_time: record.last_failure_time,
        }
    }

    /// Force the circuit closed and clear all counters.
    pub fn reset(&self) {
        let mut record = self.lock();
        let previous = record.state;
        *record = CircuitBreakerRecord::closed();
        drop(record);
        if previous != CircuitBreakerState::Closed {
            tracing::info!(from = %previous, "Circuit breaker reset");
            metrics::record_circuit_transition(CircuitBreakerState::Closed);
        }
    }
}
