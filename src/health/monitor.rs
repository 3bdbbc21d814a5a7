//! Network monitor.
//!
//! # Responsibilities
//! - Periodically probe the configured health endpoint
//! - Observe the native connectivity signal
//! - Notify subscribers once per `is_online` transition
//!
//! # Design Decisions
//! - The background task is started explicitly and cancelled through a handle
//! - All transitions are applied by the single monitor task, so notifications
//!   arrive in order and never repeat
//! - Dropping the monitor cancels the task; no timers outlive it

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use tokio::time::{self, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::MonitorConfig;
use crate::health::connectivity::{ConnectionInfo, ConnectivitySignal};
use crate::health::probe::probe;
use crate::health::state::OnlineState;
use crate::health::subscribers::{SubscriberRegistry, SubscriptionId};
use crate::net::Transport;
use crate::observability::metrics;

/// Cancels a running monitor task.
#[derive(Debug, Clone)]
pub struct MonitorHandle {
    token: CancellationToken,
}

impl MonitorHandle {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

struct RunningTask {
    token: CancellationToken,
    join: JoinHandle<()>,
}

struct MonitorShared {
    transport: Arc<dyn Transport>,
    config: MonitorConfig,
    connectivity: ConnectivitySignal,
    state: Mutex<OnlineState>,
    subscribers: SubscriberRegistry,
}

impl MonitorShared {
    fn state(&self) -> MutexGuard<'_, OnlineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn apply_native(&self, online: bool) {
        let changed = self.state().set_native(online);
        if let Some(now) = changed {
            self.publish(now, "native");
        }
    }

    fn apply_probe(&self, healthy: bool) {
        let changed = self.state().record_probe(healthy);
        if let Some(now) = changed {
            self.publish(now, "probe");
        }
    }

    fn publish(&self, online: bool, source: &'static str) {
        if online {
            tracing::info!(source, "Network back online");
        } else {
            tracing::warn!(source, "Network offline");
        }
        metrics::record_online(online);
        self.subscribers.notify(online);
    }
}

/// Combines native connectivity with active health probes.
pub struct NetworkMonitor {
    shared: Arc<MonitorShared>,
    task: Mutex<Option<RunningTask>>,
}

impl NetworkMonitor {
    pub fn new(
        transport: Arc<dyn Transport>,
        config: MonitorConfig,
        connectivity: ConnectivitySignal,
    ) -> Self {
        let state = OnlineState::new(
            connectivity.current().online,
            config.healthy_threshold,
            config.unhealthy_threshold,
        );
        Self {
            shared: Arc::new(MonitorShared {
                transport,
                config,
                connectivity,
                state: Mutex::new(state),
                subscribers: SubscriberRegistry::new(),
            }),
            task: Mutex::new(None),
        }
    }

    fn task(&self) -> MutexGuard<'_, Option<RunningTask>> {
        self.task.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_online(&self) -> bool {
        self.shared.state().is_online()
    }

    pub fn connection_info(&self) -> ConnectionInfo {
        self.shared.connectivity.current().connection
    }

    pub fn connectivity(&self) -> &ConnectivitySignal {
        &self.shared.connectivity
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.shared.subscribers.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.shared.subscribers.unsubscribe(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.shared.subscribers.len()
    }

    pub fn is_running(&self) -> bool {
        self.task()
            .as_ref()
            .is_some_and(|t| !t.token.is_cancelled() && !t.join.is_finished())
    }

    /// Start the background task. Returns the existing handle if already running.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self) -> MonitorHandle {
        let mut slot = self.task();
        if let Some(task) = slot.as_ref() {
            if !task.token.is_cancelled() && !task.join.is_finished() {
                return MonitorHandle { token: task.token.clone() };
            }
        }

        let token = CancellationToken::new();
        let join = tokio::spawn(run(self.shared.clone(), token.clone()));
        *slot = Some(RunningTask { token: token.clone(), join });
        MonitorHandle { token }
    }

    /// Stop the task and drop every subscriber. Safe to call repeatedly.
    pub fn destroy(&self) {
        if let Some(task) = self.task().take() {
            task.token.cancel();
            task.join.abort();
            tracing::debug!("Network monitor stopped");
        }
        self.shared.subscribers.clear();
    }
}

impl Drop for NetworkMonitor {
    fn drop(&mut self) {
        if let Some(task) = self.task().take() {
            task.token.cancel();
            task.join.abort();
        }
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

async fn run(shared: Arc<MonitorShared>, token: CancellationToken) {
    let mut native = shared.connectivity.subscribe();
    let online = native.borrow_and_update().online;
    shared.apply_native(online);

    let mut ticker = shared.config.health_check_url.as_ref().map(|_| {
        let mut ticker = time::interval(shared.config.interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    });

    tracing::info!(
        interval = shared.config.interval_secs,
        url = ?shared.config.health_check_url,
        "Network monitor starting"
    );

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            changed = native.changed() => {
                if changed.is_err() {
                    break;
                }
                let online = native.borrow_and_update().online;
                shared.apply_native(online);
            }
            _ = next_tick(&mut ticker) => {
                let Some(url) = shared.config.health_check_url.as_deref() else {
                    continue;
                };
                let healthy = tokio::select! {
                    _ = token.cancelled() => break,
                    healthy = probe(shared.transport.as_ref(), url, shared.config.timeout()) => healthy,
                };
                shared.apply_probe(healthy);
            }
        }
    }

    tracing::info!("Network monitor exiting");
}
