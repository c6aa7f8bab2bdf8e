//! Reconnection backoff for the push client.
//!
//! Free of any runtime dependency so the schedule can be checked directly.

use std::time::Duration;

pub const DEFAULT_BASE_DELAY_MS: u64 = 1_000;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_HANDSHAKE_TIMEOUT_MS: u64 = 10_000;
pub const OUTBOUND_BUFFER: usize = 32;

/// Retry delay grows as `base_delay * 2^(attempt - 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    base_delay: Duration,
    max_attempts: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::new(
            Duration::from_millis(DEFAULT_BASE_DELAY_MS),
            DEFAULT_MAX_ATTEMPTS,
        )
    }
}

impl BackoffPolicy {
    pub fn new(base_delay: Duration, max_attempts: u32) -> Self {
        Self {
            base_delay,
            max_attempts,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        2u32.checked_pow(exponent)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .unwrap_or(Duration::MAX)
    }
}

/// Whole milliseconds, saturating at `u64::MAX` for delays that overflow it.
pub fn saturating_millis(delay: Duration) -> u64 {
    u64::try_from(delay.as_millis()).unwrap_or(u64::MAX)
}

/// Consecutive failed attempts since the last successful handshake.
#[derive(Debug, Clone, Copy, Default)]
pub struct BackoffState {
    attempts: u32,
}

impl BackoffState {
    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn is_exhausted(&self, policy: &BackoffPolicy) -> bool {
        self.attempts >= policy.max_attempts()
    }

    /// Schedule the next retry.
    ///
    /// Returns the attempt number and the delay to wait before it, or `None`
    /// once the policy's attempts are used up.
    pub fn next_attempt(&mut self, policy: &BackoffPolicy) -> Option<(u32, Duration)> {
        if self.is_exhausted(policy) {
            return None;
        }
        self.attempts += 1;
        Some((self.attempts, policy.delay_for(self.attempts)))
    }
}
