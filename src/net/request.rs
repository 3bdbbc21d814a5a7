//! Request and response values passed through the resilience layer.
//!
//! # Responsibilities
//! - Describe an outgoing HTTP call (url, method, headers, body, timeout)
//! - Carry the correlation ID header on every attempt
//! - Hold a fully buffered response so it can be inspected after retries
//!
//! # Design Decisions
//! - Requests are cheap to clone; every attempt sends its own copy
//! - The body is buffered up front so any attempt can be replayed

use std::time::Duration;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{ResilienceError, ResilienceResult};

/// Header carrying the correlation ID of the logical operation.
pub const X_CORRELATION_ID: &str = "x-correlation-id";

/// Per-attempt timeout used when none is given.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// An outgoing HTTP request.
#[derive(Debug, Clone)]
pub struct NetworkRequest {
    pub url: String,
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
    /// Upper bound for a single attempt.
    pub timeout: Duration,
}

impl NetworkRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            headers: HeaderMap::new(),
            body: None,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    /// Add a header, rejecting names or values that are not valid HTTP.
    pub fn header(mut self, name: &str, value: &str) -> ResilienceResult<Self> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| ResilienceError::InvalidRequest(format!("header name '{}': {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| ResilienceError::InvalidRequest(format!("header '{}': {}", name, e)))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `value` as the JSON body.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> ResilienceResult<Self> {
        let bytes = serde_json::to_vec(value)
            .map_err(|e| ResilienceError::InvalidRequest(format!("json body: {}", e)))?;
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self.body = Some(bytes);
        Ok(self)
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Check the request can be sent at all.
    pub fn validate(&self) -> ResilienceResult<()> {
        url::Url::parse(&self.url)
            .map(|_| ())
            .map_err(|e| ResilienceError::InvalidRequest(format!("url '{}': {}", self.url, e)))
    }

    /// Copy of this request tagged with `correlation_id`.
    pub(crate) fn tagged(&self, correlation_id: &str) -> ResilienceResult<Self> {
        let value = HeaderValue::from_str(correlation_id).map_err(|e| {
            ResilienceError::InvalidRequest(format!("correlation id '{}': {}", correlation_id, e))
        })?;
        let mut tagged = self.clone();
        tagged.headers.insert(X_CORRELATION_ID, value);
        Ok(tagged)
    }
}

/// A fully buffered HTTP response.
#[derive(Debug, Clone)]
pub struct NetworkResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl NetworkResponse {
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Body as text; invalid UTF-8 is replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}
