//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap transport calls with a per-attempt timeout
//! - Track an optional overall deadline across attempts
//! - Pick the tighter of the two bounds for each attempt
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from other errors

use std::future::Future;
use std::time::Duration;
use tokio::time::{self, Instant};

use crate::error::NetworkError;

/// Optional wall deadline for a whole retry loop.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Option<Instant>,
}

impl Deadline {
    /// Deadline `timeout` from now. A budget too large to represent is unbounded.
    pub fn after(timeout: Option<Duration>) -> Self {
        Self {
            at: timeout.and_then(|t| Instant::now().checked_add(t)),
        }
    }

    pub fn none() -> Self {
        Self { at: None }
    }

    /// Time left, or `None` when unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.at.map(|at| at.saturating_duration_since(Instant::now()))
    }

    pub fn is_expired(&self) -> bool {
        self.remaining().is_some_and(|r| r.is_zero())
    }

    /// Tighter of `per_attempt` and the time left.
    pub fn bound(&self, per_attempt: Duration) -> Duration {
        match self.remaining() {
            Some(left) => per_attempt.min(left),
            None => per_attempt,
        }
    }
}

/// Run `fut`, failing with [`NetworkError::Timeout`] after `limit`.
pub async fn with_timeout<F, T>(limit: Duration, fut: F) -> Result<T, NetworkError>
where
    F: Future<Output = Result<T, NetworkError>>,
{
    match time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(NetworkError::Timeout(limit)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_tighter_bound_wins() {
        let deadline = Deadline::after(Some(Duration::from_secs(3)));
        assert_eq!(deadline.bound(Duration::from_secs(10)), Duration::from_secs(3));
        assert_eq!(deadline.bound(Duration::from_secs(1)), Duration::from_secs(1));

        time::advance(Duration::from_secs(2)).await;
        assert_eq!(deadline.bound(Duration::from_secs(10)), Duration::from_secs(1));
        assert!(!deadline.is_expired());

        time::advance(Duration::from_secs(1)).await;
        assert!(deadline.is_expired());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbounded_deadline() {
        let deadline = Deadline::none();
        assert_eq!(deadline.bound(Duration::from_secs(5)), Duration::from_secs(5));
        assert!(!deadline.is_expired());
        assert!(Deadline::after(None).remaining().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_budget_is_unbounded() {
        let deadline = Deadline::after(Some(Duration::MAX));
        assert!(deadline.remaining().is_none());
        assert_eq!(deadline.bound(Duration::from_secs(5)), Duration::from_secs(5));
        assert!(!deadline.is_expired());
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_timeout_elapses() {
        let result: Result<(), NetworkError> = with_timeout(Duration::from_millis(50), async {
            time::sleep(Duration::from_secs(1)).await;
            Ok(())
        })
        .await;
        assert_eq!(result, Err(NetworkError::Timeout(Duration::from_millis(50))));

        let ok = with_timeout(Duration::from_millis(50), async { Ok::<_, NetworkError>(7) }).await;
        assert_eq!(ok, Ok(7));
    }
}
