//! Correlation IDs and request spans.
//!
//! # Responsibilities
//! - Generate correlation IDs for logical operations
//! - Create the span every retry attempt runs inside

use tracing::Span;
use uuid::Uuid;

/// Fresh correlation ID (UUID v4).
pub fn new_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Span covering one logical operation across all of its attempts.
pub fn operation_span(correlation_id: &str, method: &str, url: &str) -> Span {
    tracing::info_span!(
        "resilient_request",
        correlation_id = %correlation_id,
        method = %method,
        url = %url,
    )
}
