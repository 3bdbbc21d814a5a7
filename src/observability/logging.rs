//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber for binaries and demos
//! - Honour `RUST_LOG` first, then the configured level
//!
//! The library itself only emits `tracing` events; installing a subscriber is
//! the embedding application's call.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Install a global fmt subscriber.
///
/// Fails if a global subscriber is already set.
pub fn init_logging(config: &ObservabilityConfig) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("resilient_client={}", config.log_level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(config.verbose)
                .with_span_events(if config.verbose {
                    tracing_subscriber::fmt::format::FmtSpan::CLOSE
                } else {
                    tracing_subscriber::fmt::format::FmtSpan::NONE
                }),
        )
        .try_init()
}
