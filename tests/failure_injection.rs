//! Failure injection tests for the resilient client over real HTTP.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::Method;
use resilient_client::{
    CancellationToken, CircuitBreakerState, ClientConfig, HttpTransport, NetworkError,
    ResilienceError, ResilientClient, RetryOptions,
};

mod common;

fn client(config: ClientConfig) -> ResilientClient {
    let http = reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap();
    ResilientClient::new(config, Arc::new(HttpTransport::from_client(http)))
}

fn fast_retries(config: &mut ClientConfig) {
    config.retry.base_delay_ms = 50;
    config.retry.max_delay_ms = 200;
    config.retry.request_timeout_ms = 2_000;
}

#[tokio::test]
async fn test_retry_on_failure() {
    let call_count = Arc::new(AtomicU32::new(0));
    let cc = call_count.clone();
    let backend_addr = common::start_programmable_backend(move || {
        let cc = cc.clone();
        async move {
            let count = cc.fetch_add(1, Ordering::SeqCst);
            if count < 2 {
                (503, "Service Unavailable".into())
            } else {
                (200, "Success".into())
            }
        }
    })
    .await;

    let mut config = ClientConfig::default();
    fast_retries(&mut config);
    let client = client(config);

    let request = client.request(Method::GET, format!("http://{}/data", backend_addr));
    let res = client
        .fetch_with_resilience(&request, client.retry_options())
        .await
        .expect("should eventually succeed after retries");

    assert_eq!(res.status.as_u16(), 200);
    assert_eq!(res.text(), "Success");
    assert_eq!(call_count.load(Ordering::SeqCst), 3, "Backend should have been called 3 times");
    assert_eq!(client.network_status().circuit_breaker.state, CircuitBreakerState::Closed);
}

#[tokio::test]
async fn test_circuit_breaker_opens_and_recovers() {
    let failing = Arc::new(AtomicBool::new(true));
    let call_count = Arc::new(AtomicU32::new(0));
    let (f, cc) = (failing.clone(), call_count.clone());
    let backend_addr = common::start_programmable_backend(move || {
        let (f, cc) = (f.clone(), cc.clone());
        async move {
            cc.fetch_add(1, Ordering::SeqCst);
            if f.load(Ordering::SeqCst) {
                (500, "Internal Server Error".into())
            } else {
                (200, "OK".into())
            }
        }
    })
    .await;

    let mut config = ClientConfig::default();
    fast_retries(&mut config);
    config.circuit_breaker.failure_threshold = 2;
    config.circuit_breaker.recovery_timeout_ms = 300;
    let client = client(config);
    let request = client.request(Method::GET, format!("http://{}/", backend_addr));

    let err = client
        .fetch_with_resilience(&request, client.retry_options().with_max_attempts(2))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert_eq!(client.network_status().circuit_breaker.state, CircuitBreakerState::Open);

    // Open circuit: rejected locally, backend untouched.
    let err = client
        .fetch_with_resilience(&request, client.retry_options())
        .await
        .unwrap_err();
    assert!(matches!(err, ResilienceError::CircuitOpen));
    assert_eq!(call_count.load(Ordering::SeqCst), 2);

    failing.store(false, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(400)).await;

    let res = client
        .fetch_with_resilience(&request, client.retry_options())
        .await
        .expect("probe after recovery timeout should succeed");
    assert_eq!(res.status.as_u16(), 200);

    let status = client.network_status();
    assert_eq!(status.circuit_breaker.state, CircuitBreakerState::Closed);
    assert_eq!(status.circuit_breaker.failure_count, 0);
}

#[tokio::test]
async fn test_client_error_not_retried() {
    let call_count = Arc::new(AtomicU32::new(0));
    let cc = call_count.clone();
    let backend_addr = common::start_programmable_backend(move || {
        let cc = cc.clone();
        async move {
            cc.fetch_add(1, Ordering::SeqCst);
            (404, "Not Found".into())
        }
    })
    .await;

    let mut config = ClientConfig::default();
    fast_retries(&mut config);
    let client = client(config);

    let request = client.request(Method::GET, format!("http://{}/missing", backend_addr));
    let err = client
        .fetch_with_resilience(&request, client.retry_options())
        .await
        .unwrap_err();

    assert!(matches!(err, ResilienceError::HttpStatus { status: 404, .. }));
    assert_eq!(call_count.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_connection_refused_exhausts_retries() {
    let dead_addr = common::unused_addr().await;

    let mut config = ClientConfig::default();
    fast_retries(&mut config);
    let client = client(config);

    let request = client.request(Method::GET, format!("http://{}/", dead_addr));
    let err = client
        .fetch_with_resilience(&request, client.retry_options().with_max_attempts(2))
        .await
        .unwrap_err();

    match err {
        ResilienceError::MaxRetriesExceeded { attempts, last } => {
            assert_eq!(attempts, 2);
            assert!(matches!(*last, ResilienceError::Network(NetworkError::Connect(_))));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(client.circuit_breaker().failure_count(), 2);
}

#[tokio::test]
async fn test_slow_backend_times_out_then_recovers() {
    let call_count = Arc::new(AtomicU32::new(0));
    let cc = call_count.clone();
    let backend_addr = common::start_programmable_backend(move || {
        let cc = cc.clone();
        async move {
            if cc.fetch_add(1, Ordering::SeqCst) == 0 {
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
            (200, "Fast enough".into())
        }
    })
    .await;

    let mut config = ClientConfig::default();
    fast_retries(&mut config);
    config.retry.request_timeout_ms = 200;
    let client = client(config);

    let request = client.request(Method::GET, format!("http://{}/slow", backend_addr));
    let res = client
        .fetch_with_resilience(&request, client.retry_options())
        .await
        .expect("second attempt should beat the timeout");

    assert_eq!(res.text(), "Fast enough");
    assert_eq!(call_count.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_abort_during_backoff() {
    let backend_addr =
        common::start_programmable_backend(|| async { (503, "Service Unavailable".into()) }).await;

    let mut config = ClientConfig::default();
    config.retry.base_delay_ms = 5_000;
    config.retry.max_delay_ms = 5_000;
    let client = client(config);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        trigger.cancel();
    });

    let request = client.request(Method::GET, format!("http://{}/", backend_addr));
    let started = std::time::Instant::now();
    let err = client
        .fetch_with_resilience(&request, client.retry_options().with_cancellation(cancel))
        .await
        .unwrap_err();

    assert!(matches!(err, ResilienceError::Aborted));
    assert!(started.elapsed() < Duration::from_secs(3), "abort should cut the backoff short");
}

#[tokio::test]
async fn test_overall_timeout_bounds_operation() {
    let backend_addr =
        common::start_programmable_backend(|| async { (503, "Service Unavailable".into()) }).await;

    let mut config = ClientConfig::default();
    config.circuit_breaker.failure_threshold = 100;
    let client = client(config);

    let request = client.request(Method::GET, format!("http://{}/", backend_addr));
    let options = RetryOptions::default()
        .with_max_attempts(50)
        .with_delays(Duration::from_millis(200), Duration::from_millis(200))
        .with_overall_timeout(Duration::from_millis(700));

    let started = std::time::Instant::now();
    let err = client.fetch_with_resilience(&request, options).await.unwrap_err();

    assert!(matches!(err, ResilienceError::MaxRetriesExceeded { .. }));
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn test_correlation_id_sent_on_every_attempt() {
    let (backend_addr, seen) = common::start_recording_backend("x-correlation-id").await;

    let mut config = ClientConfig::default();
    fast_retries(&mut config);
    let client = client(config);

    let request = client.request(Method::GET, format!("http://{}/", backend_addr));
    client
        .fetch_with_resilience(&request, client.retry_options().with_correlation_id("req-42"))
        .await
        .unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert!(seen.iter().all(|v| v.as_deref() == Some("req-42")));
}

#[tokio::test]
async fn test_health_check() {
    let healthy = common::start_mock_backend("ok").await;
    let unhealthy =
        common::start_programmable_backend(|| async { (503, "Service Unavailable".into()) }).await;
    let dead = common::unused_addr().await;

    let client = client(ClientConfig::default());
    let timeout = Duration::from_secs(1);

    assert!(client.health_check(&format!("http://{}/health", healthy), timeout).await);
    assert!(!client.health_check(&format!("http://{}/health", unhealthy), timeout).await);
    assert!(!client.health_check(&format!("http://{}/health", dead), timeout).await);
    assert!(!client.health_check("not a url", timeout).await);
    assert_eq!(client.circuit_breaker().failure_count(), 0);
}

#[tokio::test]
async fn test_monitor_detects_outage_and_recovery() {
    let healthy = Arc::new(AtomicBool::new(true));
    let h = healthy.clone();
    let backend_addr = common::start_programmable_backend(move || {
        let h = h.clone();
        async move {
            if h.load(Ordering::SeqCst) {
                (200, "ok".into())
            } else {
                (503, "down".into())
            }
        }
    })
    .await;

    let mut config = ClientConfig::default();
    config.monitor.health_check_url = Some(format!("http://{}/health", backend_addr));
    config.monitor.interval_secs = 1;
    config.monitor.timeout_ms = 500;
    config.monitor.healthy_threshold = 1;
    config.monitor.unhealthy_threshold = 1;
    let client = client(config);

    let events = Arc::new(Mutex::new(Vec::new()));
    let e = events.clone();
    client.subscribe(move |online| e.lock().unwrap().push(online));
    client.start_monitor();

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(client.network_status().is_online);

    healthy.store(false, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(1_300)).await;
    assert!(!client.network_status().is_online);

    healthy.store(true, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(1_100)).await;
    assert!(client.network_status().is_online);

    assert_eq!(*events.lock().unwrap(), vec![false, true]);
    client.destroy();
}
