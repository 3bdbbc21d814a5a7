//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the client.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for a resilient client.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ClientConfig {
    /// Correlation ID attached to every attempt. Generated per call when unset.
    pub correlation_id: Option<String>,

    /// Circuit breaker settings.
    pub circuit_breaker: CircuitBreakerConfig,

    /// Default retry policy.
    pub retry: RetryConfig,

    /// Network monitor settings.
    pub monitor: MonitorConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before the circuit opens.
    pub failure_threshold: u32,

    /// Time the circuit stays open before admitting a probe, in milliseconds.
    pub recovery_timeout_ms: u64,
}

impl CircuitBreakerConfig {
    pub fn recovery_timeout(&self) -> Duration {
        Duration::from_millis(self.recovery_timeout_ms)
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout_ms: 30_000,
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one.
    pub max_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,

    /// Growth factor between consecutive delays.
    pub backoff_multiplier: f64,

    /// Jitter as a fraction of the delay (0.1 = ±10%).
    pub jitter_ratio: f64,

    /// Default per-attempt timeout in milliseconds.
    pub request_timeout_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1_000,
            max_delay_ms: 10_000,
            backoff_multiplier: 2.0,
            jitter_ratio: 0.1,
            request_timeout_ms: 10_000,
        }
    }
}

/// Network monitor configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Endpoint probed periodically. Without it only the native signal is used.
    pub health_check_url: Option<String>,

    /// Probe interval in seconds.
    pub interval_secs: u64,

    /// Probe timeout in milliseconds.
    pub timeout_ms: u64,

    /// Consecutive failed probes before reporting offline.
    pub unhealthy_threshold: u32,

    /// Consecutive successful probes before reporting online again.
    pub healthy_threshold: u32,
}

impl MonitorConfig {
    /// Probe period; never shorter than one second.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            health_check_url: None,
            interval_secs: 30,
            timeout_ms: 5_000,
            unhealthy_threshold: 2,
            healthy_threshold: 2,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Include span events and targets in log output.
    pub verbose: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            verbose: false,
        }
    }
}
