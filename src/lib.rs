//! Resilient HTTP client library.
//!
//! Wraps outgoing HTTP calls with a circuit breaker, retries with jittered
//! exponential backoff, and online/offline detection.
//!
//! ```text
//!   caller
//!     │
//!     ▼
//!  ResilientClient ──────────────► NetworkStatus snapshot
//!     │                                   ▲
//!     ▼                                   │
//!  RetryOrchestrator ◀──▶ CircuitBreaker  │
//!     │                                   │
//!     ▼                                   │
//!  Transport (reqwest)      NetworkMonitor (probes + native signal)
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod health;
pub mod net;
pub mod observability;
pub mod resilience;

pub use client::{NetworkStatus, ResilientClient};
pub use config::ClientConfig;
pub use error::{NetworkError, ResilienceError, ResilienceResult};
pub use health::{ConnectivitySignal, MonitorHandle, SubscriptionId};
pub use net::{HttpTransport, NetworkRequest, NetworkResponse, Transport};
pub use resilience::{CircuitBreakerState, RetryOptions};
pub use tokio_util::sync::CancellationToken;
