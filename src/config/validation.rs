//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (thresholds > 0, ratios in bounds)
//! - Check the health check URL parses
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ClientConfig → Result<(), Vec<ValidationError>>

use std::fmt;
use crate::config::schema::ClientConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, collecting every error found.
pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let cb = &config.circuit_breaker;
    if cb.failure_threshold == 0 {
        errors.push(ValidationError::new("circuit_breaker.failure_threshold", "must be at least 1"));
    }

    let retry = &config.retry;
    if retry.max_attempts == 0 {
        errors.push(ValidationError::new("retry.max_attempts", "must be at least 1"));
    }
    if retry.base_delay_ms > retry.max_delay_ms {
        errors.push(ValidationError::new(
            "retry.base_delay_ms",
            format!("must not exceed max_delay_ms ({})", retry.max_delay_ms),
        ));
    }
    if retry.backoff_multiplier.is_nan() || retry.backoff_multiplier < 1.0 {
        errors.push(ValidationError::new("retry.backoff_multiplier", "must be >= 1.0"));
    }
    if !(0.0..=1.0).contains(&retry.jitter_ratio) {
        errors.push(ValidationError::new("retry.jitter_ratio", "must be within 0.0..=1.0"));
    }
    if retry.request_timeout_ms == 0 {
        errors.push(ValidationError::new("retry.request_timeout_ms", "must be greater than 0"));
    }

    let monitor = &config.monitor;
    if let Some(url) = &monitor.health_check_url {
        if let Err(e) = url::Url::parse(url) {
            errors.push(ValidationError::new(
                "monitor.health_check_url",
                format!("invalid URL '{}': {}", url, e),
            ));
        }
    }
    if monitor.interval_secs == 0 {
        errors.push(ValidationError::new("monitor.interval_secs", "must be greater than 0"));
    }
    if monitor.timeout_ms == 0 {
        errors.push(ValidationError::new("monitor.timeout_ms", "must be greater than 0"));
    }
    if monitor.healthy_threshold == 0 || monitor.unhealthy_threshold == 0 {
        errors.push(ValidationError::new("monitor", "probe thresholds must be at least 1"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
