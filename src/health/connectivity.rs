//! Native connectivity signal.
//!
//! The embedding application forwards the platform's online/offline events
//! and connection type here; the network monitor observes the latest value.

use std::sync::Arc;
use serde::Serialize;
use tokio::sync::watch;

/// Connection details reported by the platform, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConnectionInfo {
    /// Effective connection type, e.g. `4g`, `3g`, `slow-2g`.
    pub effective_type: Option<String>,
}

/// Latest native reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeConnectivity {
    pub online: bool,
    pub connection: ConnectionInfo,
}

impl Default for NativeConnectivity {
    fn default() -> Self {
        Self {
            online: true,
            connection: ConnectionInfo::default(),
        }
    }
}

/// Cloneable handle for publishing native connectivity changes.
#[derive(Debug, Clone)]
pub struct ConnectivitySignal {
    tx: Arc<watch::Sender<NativeConnectivity>>,
}

impl ConnectivitySignal {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(NativeConnectivity::default());
        Self { tx: Arc::new(tx) }
    }

    /// Record a native online/offline event. Repeats of the current value are ignored.
    pub fn set_online(&self, online: bool) {
        self.tx.send_if_modified(|current| {
            if current.online == online {
                return false;
            }
            current.online = online;
            true
        });
    }

    pub fn set_effective_type(&self, effective_type: Option<String>) {
        self.tx.send_if_modified(|current| {
            if current.connection.effective_type == effective_type {
                return false;
            }
            current.connection.effective_type = effective_type;
            true
        });
    }

    pub fn current(&self) -> NativeConnectivity {
        self.tx.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<NativeConnectivity> {
        self.tx.subscribe()
    }
}

impl Default for ConnectivitySignal {
    fn default() -> Self {
        Self::new()
    }
}
