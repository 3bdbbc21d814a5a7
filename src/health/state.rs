//! Online state machine.
//!
//! # Inputs
//! - Native signal: online/offline as reported by the platform
//! - Probe results: periodic health checks against a known endpoint
//!
//! # State Transitions
//! ```text
//! is_online = native_online AND probe_healthy
//!
//! native offline event     → native_online = false immediately
//! probe_healthy → false    : consecutive failed probes >= unhealthy_threshold
//! probe_healthy → true     : consecutive good probes >= healthy_threshold
//! ```
//!
//! # Design Decisions
//! - Hysteresis on probes prevents flapping when the two signals disagree
//! - A native offline event is trusted at once; native online needs probes to agree
//! - Probe health starts optimistic
//! - Counters reset on state transition

/// Combined connectivity state with probe hysteresis.
#[derive(Debug, Clone)]
pub struct OnlineState {
    native_online: bool,
    probe_healthy: bool,
    consecutive_successes: u32,
    consecutive_failures: u32,
    healthy_threshold: u32,
    unhealthy_threshold: u32,
}

impl OnlineState {
    pub fn new(native_online: bool, healthy_threshold: u32, unhealthy_threshold: u32) -> Self {
        Self {
            native_online,
            probe_healthy: true,
            consecutive_successes: 0,
            consecutive_failures: 0,
            healthy_threshold: healthy_threshold.max(1),
            unhealthy_threshold: unhealthy_threshold.max(1),
        }
    }

    pub fn is_online(&self) -> bool {
        self.native_online && self.probe_healthy
    }

    pub fn probe_healthy(&self) -> bool {
        self.probe_healthy
    }

    /// Apply a probe result. Returns the new `is_online` if it changed.
    pub fn record_probe(&mut self, healthy: bool) -> Option<bool> {
        let before = self.is_online();
        if healthy {
            self.consecutive_failures = 0;
            if !self.probe_healthy {
                self.consecutive_successes += 1;
                if self.consecutive_successes >= self.healthy_threshold {
                    self.probe_healthy = true;
                    self.consecutive_successes = 0;
                }
            }
        } else {
            self.consecutive_successes = 0;
            if self.probe_healthy {
                self.consecutive_failures += 1;
                if self.consecutive_failures >= self.unhealthy_threshold {
                    self.probe_healthy = false;
                    self.consecutive_failures = 0;
                }
            }
        }
        self.changed_from(before)
    }

    /// Apply a native online/offline reading. Returns the new `is_online` if it changed.
    pub fn set_native(&mut self, online: bool) -> Option<bool> {
        let before = self.is_online();
        self.native_online = online;
        self.changed_from(before)
    }

    fn changed_from(&self, before: bool) -> Option<bool> {
        let now = self.is_online();
        (now != before).then_some(now)
    }
}
