//! Read-only network status snapshot.

use serde::Serialize;

use crate::health::ConnectionInfo;
use crate::resilience::CircuitBreakerSnapshot;

/// Point-in-time view of connectivity and breaker state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkStatus {
    pub is_online: bool,
    pub circuit_breaker: CircuitBreakerSnapshot,
    pub connection_info: ConnectionInfo,
}
