//! Exponential backoff with jitter.

use std::time::Duration;
use rand::Rng;

/// Parameters of the backoff curve.
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
    /// Fraction of the delay added or removed at random (0.1 = ±10%).
    pub jitter_ratio: f64,
}

impl BackoffPolicy {
    /// Unclamped, unjittered delay in milliseconds for `attempt` (1-based).
    fn exponential_ms(&self, attempt: u32) -> f64 {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        self.base_delay.as_millis() as f64 * self.multiplier.powi(exponent)
    }
}

fn clamp_ms(delay_ms: f64, max: Duration) -> Duration {
    let max_ms = max.as_millis() as f64;
    if !delay_ms.is_finite() || delay_ms >= max_ms {
        max
    } else {
        Duration::from_millis(delay_ms.max(0.0).round() as u64)
    }
}

/// Calculate the delay before retrying after failed `attempt` (1-based).
///
/// `min(base * multiplier^(attempt-1) * (1 ± jitter), max)`
pub fn calculate_backoff(attempt: u32, policy: &BackoffPolicy) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let delay_ms = policy.exponential_ms(attempt);

    let ratio = policy.jitter_ratio.clamp(0.0, 1.0);
    let factor = if ratio > 0.0 {
        1.0 + rand::thread_rng().gen_range(-ratio..=ratio)
    } else {
        1.0
    };

    clamp_ms(delay_ms * factor, policy.max_delay)
}
