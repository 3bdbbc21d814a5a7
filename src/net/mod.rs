//! Network plumbing subsystem.
//!
//! # Data Flow
//! ```text
//! NetworkRequest (request.rs)
//!     → tagged with correlation ID per attempt
//!     → Transport::send (transport.rs)
//!     → NetworkResponse (buffered) or NetworkError
//! ```
//!
//! # Design Decisions
//! - The layer passes through arbitrary HTTP requests; no wire format of its own
//! - Transport is a trait so tests and embedders can swap the HTTP stack

pub mod request;
pub mod transport;

pub use request::{NetworkRequest, NetworkResponse, DEFAULT_REQUEST_TIMEOUT, X_CORRELATION_ID};
pub use transport::{HttpTransport, Transport};
