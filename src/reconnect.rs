//! Bounded exponential backoff for reconnection.
//!
//! The policy is a pure state machine scoped to one logical session
//! lifetime: an attempt counter plus the delay computation
//! `min(base * 2^attempt, max)`. Exhausting the attempt budget is
//! terminal for the session; the counter resets whenever a connection
//! successfully opens.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Reconnection tuning.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReconnectConfig {
    /// Maximum reconnect attempts before giving up (default: 5).
    pub max_attempts: u32,
    /// Base delay; attempt `k` (1-indexed) waits `base * 2^k`
    /// (default: 1 second, so the first retry waits 2 seconds).
    pub base_delay: Duration,
    /// Ceiling on the computed delay (default: 30 seconds).
    pub max_delay: Duration,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl ReconnectConfig {
    /// Create a config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a config that never reconnects.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            max_attempts: 0,
            ..Default::default()
        }
    }

    /// Create a config suitable for testing (short delays).
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(50),
        }
    }
}

/// Attempt counter and delay computation for one session lifetime.
#[derive(Debug)]
pub struct ReconnectPolicy {
    config: ReconnectConfig,
    attempts: u32,
}

impl ReconnectPolicy {
    /// Create a fresh policy.
    #[must_use]
    pub fn new(config: ReconnectConfig) -> Self {
        Self {
            config,
            attempts: 0,
        }
    }

    /// Attempts made since the last successful open.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Whether the attempt budget is exhausted.
    #[must_use]
    pub fn exhausted(&self) -> bool {
        self.attempts >= self.config.max_attempts
    }

    /// Register the next attempt and return its delay, or `None` once
    /// the budget is exhausted.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.exhausted() {
            return None;
        }
        self.attempts += 1;
        let exponential = self
            .config
            .base_delay
            .saturating_mul(2_u32.saturating_pow(self.attempts));
        Some(exponential.min(self.config.max_delay))
    }

    /// Reset the counter after a successful open.
    pub fn reset(&mut self) {
        self.attempts = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_backoff_ladder_is_exact() {
        let mut policy = ReconnectPolicy::new(ReconnectConfig::default());
        let delays: Vec<u64> = std::iter::from_fn(|| policy.next_delay())
            .map(|d| u64::try_from(d.as_millis()).unwrap())
            .collect();
        assert_eq!(delays, vec![2000, 4000, 8000, 16000, 30000]);
    }

    #[test]
    fn test_no_delay_once_exhausted() {
        let mut policy = ReconnectPolicy::new(ReconnectConfig::default());
        for _ in 0..5 {
            assert!(policy.next_delay().is_some());
        }
        assert!(policy.exhausted());
        assert_eq!(policy.next_delay(), None);
        assert_eq!(policy.attempts(), 5);
    }

    #[test]
    fn test_attempts_track_min_of_n_and_max() {
        let mut policy = ReconnectPolicy::new(ReconnectConfig::default());
        for n in 1..=8_u32 {
            let _ = policy.next_delay();
            assert_eq!(policy.attempts(), n.min(5));
        }
    }

    #[test]
    fn test_reset_restores_full_budget() {
        let mut policy = ReconnectPolicy::new(ReconnectConfig::default());
        for _ in 0..5 {
            let _ = policy.next_delay();
        }
        policy.reset();
        assert_eq!(policy.attempts(), 0);
        assert_eq!(policy.next_delay(), Some(Duration::from_millis(2000)));
    }

    #[test]
    fn test_disabled_never_schedules() {
        let mut policy = ReconnectPolicy::new(ReconnectConfig::disabled());
        assert!(policy.exhausted());
        assert_eq!(policy.next_delay(), None);
    }
}
