//! Connectivity health subsystem.
//!
//! # Data Flow
//! ```text
//! Active probes (probe.rs):
//!     Periodic timer in monitor.rs
//!     → Bounded GET against the health endpoint
//!     → state.rs (probe hysteresis)
//!
//! Native signal (connectivity.rs):
//!     Platform online/offline event
//!     → monitor.rs observes the watch channel
//!     → state.rs
//!
//! State machine (state.rs):
//!     Online ←→ Offline
//!     → subscribers.rs notified once per transition
//! ```
//!
//! # Design Decisions
//! - Native status alone is unreliable; probes confirm it
//! - Probe transitions require consecutive results to prevent flapping
//! - Probe failures are logged, never thrown

pub mod connectivity;
pub mod monitor;
pub mod probe;
pub mod state;
pub mod subscribers;

pub use connectivity::{ConnectionInfo, ConnectivitySignal, NativeConnectivity};
pub use monitor::{MonitorHandle, NetworkMonitor};
pub use probe::probe;
pub use state::OnlineState;
pub use subscribers::{StatusCallback, SubscriberRegistry, SubscriptionId};
