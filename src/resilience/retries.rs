//! Retry logic.
//!
//! # Responsibilities
//! - Classify failures as retryable or not
//! - Run one logical operation as a bounded sequence of attempts
//! - Consult the circuit breaker before every attempt and report outcomes
//! - Sleep with jittered exponential backoff between retryable failures
//!
//! # Design Decisions
//! - Open circuit fails fast without counting an attempt
//! - Cancellation aborts the whole loop and is never a breaker failure
//! - Non-retryable failures still count against the breaker
//! - Connection errors, timeouts, 5xx and 429 are retryable by default

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::config::RetryConfig;
use crate::error::{NetworkError, ResilienceError, ResilienceResult};
use crate::net::{NetworkRequest, NetworkResponse, Transport};
use crate::observability::{metrics, tracing::{new_correlation_id, operation_span}};
use crate::resilience::backoff::{calculate_backoff, BackoffPolicy};
use crate::resilience::circuit_breaker::{Admission, CircuitBreaker};
use crate::resilience::timeouts::{with_timeout, Deadline};

/// Decides whether a failed attempt may be retried.
pub type RetryPredicate = Arc<dyn Fn(&ResilienceError) -> bool + Send + Sync>;

/// Default classification.
pub fn is_retryable(error: &ResilienceError) -> bool {
    match error {
        ResilienceError::Network(_) => true,
        ResilienceError::HttpStatus { status, .. } => (500..600).contains(status) || *status == 429,
        _ => false,
    }
}

/// Per-call retry policy.
#[derive(Clone)]
pub struct RetryOptions {
    /// Total attempts including the first (at least 1).
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    pub jitter_ratio: f64,
    pub retryable: RetryPredicate,
    /// Tag for every attempt; generated when unset.
    pub correlation_id: Option<String>,
    pub cancel: Option<CancellationToken>,
    /// Bound on the whole operation, backoff sleeps included.
    pub overall_timeout: Option<Duration>,
}

impl RetryOptions {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            backoff_multiplier: config.backoff_multiplier,
            jitter_ratio: config.jitter_ratio,
            retryable: Arc::new(is_retryable),
            correlation_id: None,
            cancel: None,
            overall_timeout: None,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_delays(mut self, base_delay: Duration, max_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self.max_delay = max_delay;
        self
    }

    pub fn with_jitter(mut self, jitter_ratio: f64) -> Self {
        self.jitter_ratio = jitter_ratio;
        self
    }

    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn with_overall_timeout(mut self, timeout: Duration) -> Self {
        self.overall_timeout = Some(timeout);
        self
    }

    pub fn with_retryable<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&ResilienceError) -> bool + Send + Sync + 'static,
    {
        self.retryable = Arc::new(predicate);
        self
    }

    pub fn backoff_policy(&self) -> BackoffPolicy {
        BackoffPolicy {
            base_delay: self.base_delay,
            max_delay: self.max_delay,
            multiplier: self.backoff_multiplier,
            jitter_ratio: self.jitter_ratio,
        }
    }
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl fmt::Debug for RetryOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryOptions")
            .field("max_attempts", &self.max_attempts)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .field("backoff_multiplier", &self.backoff_multiplier)
            .field("jitter_ratio", &self.jitter_ratio)
            .field("correlation_id", &self.correlation_id)
            .field("cancellable", &self.cancel.is_some())
            .field("overall_timeout", &self.overall_timeout)
            .finish_non_exhaustive()
    }
}

async fn cancelled(token: Option<&CancellationToken>) {
    match token {
        Some(token) => token.cancelled().await,
        None => std::future::pending().await,
    }
}

/// Runs requests through the breaker with retries.
pub struct RetryOrchestrator {
    breaker: Arc<CircuitBreaker>,
    transport: Arc<dyn Transport>,
}

impl RetryOrchestrator {
    pub fn new(breaker: Arc<CircuitBreaker>, transport: Arc<dyn Transport>) -> Self {
        Self { breaker, transport }
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    /// Execute `request` under `options`, returning the first 2xx response.
    pub async fn execute_with_retry(
        &self,
        request: &NetworkRequest,
        options: &RetryOptions,
    ) -> ResilienceResult<NetworkResponse> {
        request.validate()?;
        let correlation_id = options
            .correlation_id
            .clone()
            .unwrap_or_else(new_correlation_id);
        let tagged = request.tagged(&correlation_id)?;
        let span = operation_span(&correlation_id, tagged.method.as_str(), &tagged.url);
        self.run(&tagged, options).instrument(span).await
    }

    async fn run(&self, request: &NetworkRequest, options: &RetryOptions) -> ResilienceResult<NetworkResponse> {
        let max_attempts = options.max_attempts.max(1);
        let deadline = Deadline::after(options.overall_timeout);
        let backoff = options.backoff_policy();
        let cancel = options.cancel.as_ref();

        let mut attempts = 0;
        let mut last_error: Option<ResilienceError> = None;

        for attempt in 1..=max_attempts {
            if cancel.is_some_and(CancellationToken::is_cancelled) {
                return Err(ResilienceError::Aborted);
            }
            if deadline.is_expired() {
                tracing::warn!(attempt, "Overall timeout reached before attempt");
                break;
            }

            let (admission, probe_slot) = self.breaker.admit_guarded();
            if admission == Admission::Rejected {
                tracing::debug!("Circuit open, failing fast");
                metrics::record_rejected();
                return Err(ResilienceError::CircuitOpen);
            }
            attempts = attempt;

            let limit = deadline.bound(request.timeout);
            let attempt_request = if limit < request.timeout {
                Cow::Owned(request.clone().timeout(limit))
            } else {
                Cow::Borrowed(request)
            };
            let outcome = tokio::select! {
                biased;
                _ = cancelled(cancel) => {
                    metrics::record_attempt("aborted");
                    tracing::info!(attempt, "Request aborted during attempt");
                    return Err(ResilienceError::Aborted);
                }
                result = with_timeout(limit, self.transport.send(&attempt_request)) => result,
            };
            if let Some(slot) = probe_slot {
                slot.disarm();
            }

            let error = match outcome {
                Ok(response) if response.is_success() => {
                    self.breaker.record_success();
                    metrics::record_attempt("success");
                    if attempt > 1 {
                        tracing::info!(attempt, status = %response.status, "Request succeeded after retry");
                    }
                    return Ok(response);
                }
                Ok(response) => ResilienceError::HttpStatus {
                    status: response.status.as_u16(),
                    url: request.url.clone(),
                },
                Err(e) => ResilienceError::Network(e),
            };

            self.breaker.record_failure();
            metrics::record_attempt(error.kind());

            if !(options.retryable)(&error) {
                tracing::warn!(attempt, error = %error, "Non-retryable failure");
                return Err(error);
            }
            if attempt == max_attempts {
                tracing::warn!(attempt, error = %error, "Retry budget exhausted");
                last_error = Some(error);
                break;
            }

            let delay = deadline.bound(calculate_backoff(attempt, &backoff));
            tracing::info!(attempt, delay = ?delay, error = %error, "Retrying request");
            last_error = Some(error);

            tokio::select! {
                biased;
                _ = cancelled(cancel) => {
                    tracing::info!(attempt, "Request aborted during backoff");
                    return Err(ResilienceError::Aborted);
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }

        match last_error {
            Some(last) => Err(ResilienceError::MaxRetriesExceeded {
                attempts,
                last: Box::new(last),
            }),
            // Deadline already spent before the first attempt.
            None => Err(ResilienceError::Network(NetworkError::Timeout(
                options.overall_timeout.unwrap_or_default(),
            ))),
        }
    }
}
