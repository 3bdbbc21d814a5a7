//! Single bounded health probe.
//!
//! Bypasses retries and the circuit breaker. Failures are logged and folded
//! into `false`, never returned as errors.

use std::time::Duration;
use reqwest::header::{HeaderValue, USER_AGENT};

use crate::error::NetworkError;
use crate::net::{NetworkRequest, Transport};
use crate::observability::metrics;
use crate::resilience::timeouts::with_timeout;

/// Probe `url` once; true only for a 2xx answer within `timeout`.
pub async fn probe(transport: &dyn Transport, url: &str, timeout: Duration) -> bool {
    let mut request = NetworkRequest::get(url).timeout(timeout);
    request
        .headers
        .insert(USER_AGENT, HeaderValue::from_static("resilient-client-health-check"));

    if let Err(e) = request.validate() {
        tracing::error!(url = %url, error = %e, "Health check misconfigured");
        metrics::record_health_probe(false);
        return false;
    }

    let healthy = match with_timeout(timeout, transport.send(&request)).await {
        Ok(response) => {
            let success = response.is_success();
            if !success {
                tracing::warn!(url = %url, status = %response.status, "Health check failed: non-success status");
            }
            success
        }
        Err(NetworkError::Timeout(_)) => {
            tracing::warn!(url = %url, "Health check failed: timeout");
            false
        }
        Err(e) => {
            tracing::warn!(url = %url, error = %e, "Health check failed: connection error");
            false
        }
    };

    metrics::record_health_probe(healthy);
    healthy
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::transport::mock::{ScriptedTransport, Step};

    #[tokio::test(start_paused = true)]
    async fn test_probe_outcomes() {
        let transport = ScriptedTransport::new(
            vec![
                Step::Status(200),
                Step::Status(503),
                Step::Fail(NetworkError::Connect("refused".into())),
                Step::Slow(Duration::from_secs(10), 200),
            ],
            Step::Status(204),
        );
        let url = "http://svc.local/health";
        let timeout = Duration::from_secs(1);

        assert!(probe(&transport, url, timeout).await);
        assert!(!probe(&transport, url, timeout).await);
        assert!(!probe(&transport, url, timeout).await);
        assert!(!probe(&transport, url, timeout).await);
        assert!(probe(&transport, url, timeout).await);
        assert_eq!(transport.calls(), 5);
    }

    #[tokio::test]
    async fn test_bad_url_is_unhealthy_without_a_call() {
        let transport = ScriptedTransport::always(Step::Status(200));
        assert!(!probe(&transport, "nope", Duration::from_secs(1)).await);
        assert_eq!(transport.calls(), 0);
    }
}
