//! Underlying HTTP transport.
//!
//! # Responsibilities
//! - Send one attempt of a request and buffer the response
//! - Classify transport failures (timeout, connect, other)
//!
//! # Design Decisions
//! - Any HTTP status is returned as a response; the orchestrator decides
//!   what counts as failure
//! - The trait is the injection seam for tests and custom stacks

use async_trait::async_trait;

use crate::error::NetworkError;
use crate::net::request::{NetworkRequest, NetworkResponse};

/// Sends a single HTTP attempt.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &NetworkRequest) -> Result<NetworkResponse, NetworkError>;
}

/// Default transport backed by a pooled `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, NetworkError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("resilient-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| NetworkError::Transport(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Wrap an existing client (custom TLS, proxies, pool settings).
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn classify(request: &NetworkRequest, e: reqwest::Error) -> NetworkError {
    if e.is_timeout() {
        NetworkError::Timeout(request.timeout)
    } else if e.is_connect() {
        NetworkError::Connect(e.to_string())
    } else {
        NetworkError::Transport(e.to_string())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &NetworkRequest) -> Result<NetworkResponse, NetworkError> {
        let mut builder = self
            .client
            .request(request.method.clone(), &request.url)
            .headers(request.headers.clone())
            .timeout(request.timeout);
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(|e| classify(request, e))?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(|e| classify(request, e))?;

        Ok(NetworkResponse {
            status,
            headers,
            body: body.to_vec(),
        })
    }
}
