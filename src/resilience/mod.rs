//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! fetch_with_resilience:
//!     → circuit_breaker.rs (admit or fail fast)
//!     → timeouts.rs (per-attempt timeout, overall deadline)
//!     → Transport
//!     → circuit_breaker.rs (record success/failure)
//!     → On retryable failure: backoff.rs (jittered delay), next attempt in retries.rs
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every attempt has a deadline
//! - Circuit breaker prevents hammering a failing dependency
//! - Cancellation is explicit and never penalizes the breaker

pub mod backoff;
pub mod circuit_breaker;
pub mod retries;
pub mod timeouts;

pub use backoff::{calculate_backoff, BackoffPolicy};
pub use circuit_breaker::{
    Admission, CircuitBreaker, CircuitBreakerSnapshot, CircuitBreakerState, ProbeGuard,
};
pub use retries::{is_retryable, RetryOptions, RetryOrchestrator, RetryPredicate};
pub use timeouts::Deadline;
