//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! circuit breaker, retry loop, monitor
//!     → logging.rs (subscriber setup for binaries)
//!     → metrics.rs (attempt, breaker and probe counters; online gauge)
//!     → tracing.rs (correlation IDs and the per-operation span)
//! ```
//!
//! # Design Decisions
//! - Correlation ID flows through every attempt of an operation
//! - Metrics go through the `metrics` facade; exporters are the embedder's choice

pub mod logging;
pub mod metrics;
pub mod tracing;
