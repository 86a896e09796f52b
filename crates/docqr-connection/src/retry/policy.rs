//! Attempt count and inter-attempt delays for connecting

use std::time::Duration;

/// Number of connect attempts made by default
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Wait between attempts by default
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(5);

/// Cap for exponentially growing delays
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(60);

/// Upper bound on a single connect attempt
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(30);

/// How many times to try connecting and how long to wait in between.
///
/// A policy is read-only while a connect sequence runs; the manager only
/// ever borrows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one (always at least 1)
    max_attempts: u32,
    /// Delay after the first failed attempt
    base_delay: Duration,
    /// Double the delay after each further failure
    exponential: bool,
    /// Cap for exponential growth
    max_delay: Duration,
    /// Bound on how long a single attempt may take
    attempt_timeout: Duration,
}

impl RetryPolicy {
    /// Create a flat policy. `max_attempts` of 0 is treated as 1.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            exponential: false,
            max_delay: DEFAULT_MAX_DELAY,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Switch between flat and doubling delays.
    pub fn exponential(mut self, enabled: bool) -> Self {
        self.exponential = enabled;
        self
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn with_attempt_timeout(mut self, attempt_timeout: Duration) -> Self {
        self.attempt_timeout = attempt_timeout;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    pub fn is_exponential(&self) -> bool {
        self.exponential
    }

    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    pub fn attempt_timeout(&self) -> Duration {
        self.attempt_timeout
    }

    /// Delay to wait after `attempt` (1-based) failed.
    ///
    /// Flat policies always return the base delay. Exponential policies
    /// return `base_delay * 2^(attempt - 1)`, capped at the max delay but
    /// never below the base delay.
    pub fn delay_before_retry(&self, attempt: u32) -> Duration {
        if !self.exponential {
            return self.base_delay;
        }

        let cap = self.max_delay.max(self.base_delay);
        let exponent = attempt.max(1) - 1;

        2u32.checked_pow(exponent)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .map_or(cap, |delay| delay.min(cap))
    }

    /// Sum of every wait in a sequence where all attempts fail.
    pub fn total_wait(&self) -> Duration {
        (1..self.max_attempts)
            .map(|attempt| self.delay_before_retry(attempt))
            .fold(Duration::ZERO, Duration::saturating_add)
    }
}

impl Default for RetryPolicy {
    /// 5 attempts, 5 seconds apart
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_BASE_DELAY)
    }
}
