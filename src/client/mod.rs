//! Resilient client façade.
//!
//! # Responsibilities
//! - Own one circuit breaker, retry orchestrator and network monitor per target
//! - Expose fetch, health check, status snapshot, breaker reset and teardown
//!
//! # Design Decisions
//! - Callers construct and pass clients explicitly; there is no global instance
//! - The monitor only runs once `start_monitor` is called
//! - Teardown is idempotent and also happens on drop

pub mod status;

use std::sync::Arc;
use std::time::Duration;
use reqwest::Method;

use crate::config::ClientConfig;
use crate::error::ResilienceResult;
use crate::health::{probe, ConnectivitySignal, MonitorHandle, NetworkMonitor, SubscriptionId};
use crate::net::{HttpTransport, NetworkRequest, NetworkResponse, Transport};
use crate::resilience::{CircuitBreaker, RetryOptions, RetryOrchestrator};

pub use status::NetworkStatus;

/// HTTP client wrapped with circuit breaking, retries and connectivity monitoring.
pub struct ResilientClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    breaker: Arc<CircuitBreaker>,
    orchestrator: RetryOrchestrator,
    monitor: NetworkMonitor,
}

impl ResilientClient {
    /// Build a client over an arbitrary transport.
    pub fn new(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        let breaker = Arc::new(CircuitBreaker::new(&config.circuit_breaker));
        let orchestrator = RetryOrchestrator::new(breaker.clone(), transport.clone());
        let monitor = NetworkMonitor::new(
            transport.clone(),
            config.monitor.clone(),
            ConnectivitySignal::new(),
        );

        tracing::debug!(
            failure_threshold = config.circuit_breaker.failure_threshold,
            recovery_timeout_ms = config.circuit_breaker.recovery_timeout_ms,
            health_check_url = ?config.monitor.health_check_url,
            "Resilient client created"
        );

        Self {
            config,
            transport,
            breaker,
            orchestrator,
            monitor,
        }
    }

    /// Build a client over the default `reqwest` transport.
    pub fn from_config(config: ClientConfig) -> ResilienceResult<Self> {
        let transport = HttpTransport::new()?;
        Ok(Self::new(config, Arc::new(transport)))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// New request using the configured per-attempt timeout.
    pub fn request(&self, method: Method, url: impl Into<String>) -> NetworkRequest {
        NetworkRequest::new(method, url)
            .timeout(Duration::from_millis(self.config.retry.request_timeout_ms))
    }

    /// Retry options seeded from the configuration.
    pub fn retry_options(&self) -> RetryOptions {
        let options = RetryOptions::from_config(&self.config.retry);
        match &self.config.correlation_id {
            Some(id) => options.with_correlation_id(id.clone()),
            None => options,
        }
    }

    /// Send `request` through the circuit breaker with retries.
    pub async fn fetch_with_resilience(
        &self,
        request: &NetworkRequest,
        mut options: RetryOptions,
    ) -> ResilienceResult<NetworkResponse> {
        if options.correlation_id.is_none() {
            options.correlation_id = self.config.correlation_id.clone();
        }
        self.orchestrator.execute_with_retry(request, &options).await
    }

    /// One bounded probe; no retries, no breaker involvement.
    pub async fn health_check(&self, url: &str, timeout: Duration) -> bool {
        probe(self.transport.as_ref(), url, timeout).await
    }

    pub fn network_status(&self) -> NetworkStatus {
        NetworkStatus {
            is_online: self.monitor.is_online(),
            circuit_breaker: self.breaker.snapshot(),
            connection_info: self.monitor.connection_info(),
        }
    }

    pub fn reset_circuit_breaker(&self) {
        self.breaker.reset();
    }

    pub fn circuit_breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Handle for feeding native online/offline and connection-type events.
    pub fn connectivity(&self) -> ConnectivitySignal {
        self.monitor.connectivity().clone()
    }

    /// Register for online-status transitions.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.monitor.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.monitor.unsubscribe(id)
    }

    /// Start connectivity monitoring. Must run inside a Tokio runtime.
    pub fn start_monitor(&self) -> MonitorHandle {
        self.monitor.start()
    }

    /// Stop monitoring and drop subscribers. Idempotent.
    pub fn destroy(&self) {
        self.monitor.destroy();
    }
}
