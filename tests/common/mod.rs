//! Shared utilities for integration and load testing.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::http::{HeaderMap, StatusCode};
use axum::Router;
use tokio::net::TcpListener;

/// Start a programmable mock backend on an ephemeral port.
///
/// Every request, whatever its path, is answered with `f()`.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    let app = Router::new().fallback(move || {
        let f = f.clone();
        async move {
            let (status, body) = f().await;
            (StatusCode::from_u16(status).unwrap(), body)
        }
    });

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// Start a mock backend that always answers 200 with `body`.
#[allow(dead_code)]
pub async fn start_mock_backend(body: &'static str) -> SocketAddr {
    start_programmable_backend(move || async move { (200, body.to_string()) }).await
}

/// Start a backend that records the value of `header` on every request.
#[allow(dead_code)]
pub async fn start_recording_backend(header: &'static str) -> (SocketAddr, Arc<Mutex<Vec<Option<String>>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorded = seen.clone();

    let app = Router::new().fallback(move |headers: HeaderMap| {
        let recorded = recorded.clone();
        async move {
            let value = headers
                .get(header)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let mut recorded = recorded.lock().unwrap();
            recorded.push(value);
            // Fail the first call so retries are exercised.
            if recorded.len() == 1 {
                (StatusCode::SERVICE_UNAVAILABLE, "warming up")
            } else {
                (StatusCode::OK, "ok")
            }
        }
    });

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (addr, seen)
}

/// An address nothing is listening on.
#[allow(dead_code)]
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}
