//! Connection retry logic with exponential backoff
//!
//! Only connection failures are retried; authentication failures and
//! anything after the session is open fail the device immediately.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default maximum number of retry attempts
pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;

/// Default initial delay between retries in milliseconds
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 1000;

/// Default maximum delay between retries in milliseconds
pub const DEFAULT_MAX_DELAY_MS: u64 = 30_000;

/// Default backoff multiplier (delay doubles each retry)
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;

/// Configuration for connection retry behavior
///
/// The delay between retries is calculated as:
/// `min(initial_delay * multiplier^attempt, max_delay)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (0 = no retries)
    pub max_attempts: u32,
    /// Initial delay between retries in milliseconds
    pub initial_delay_ms: u64,
    /// Maximum delay between retries in milliseconds
    pub max_delay_ms: u64,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
    /// Whether retry is enabled
    pub enabled: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_delay_ms: DEFAULT_INITIAL_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            enabled: true,
        }
    }
}

impl RetryConfig {
    /// Creates a new retry configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a retry configuration with no retries (single attempt)
    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 0,
            enabled: false,
            ..Self::default()
        }
    }

    /// Sets the maximum number of retry attempts
    #[must_use]
    pub const fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Sets the initial delay between retries
    #[must_use]
    pub const fn with_initial_delay_ms(mut self, delay_ms: u64) -> Self {
        self.initial_delay_ms = delay_ms;
        self
    }

    /// Sets the maximum delay between retries
    #[must_use]
    pub const fn with_max_delay_ms(mut self, delay_ms: u64) -> Self {
        self.max_delay_ms = delay_ms;
        self
    }

    /// Sets the backoff multiplier
    #[must_use]
    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Calculates the delay for a given attempt number (0-indexed)
    ///
    /// Returns `None` if retry is disabled or attempt exceeds max_attempts.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Option<Duration> {
        if !self.should_retry(attempt) {
            return None;
        }

        let delay_ms = self.initial_delay_ms as f64 * self.backoff_multiplier.powi(attempt as i32);
        let capped_delay_ms = (delay_ms as u64).min(self.max_delay_ms);

        Some(Duration::from_millis(capped_delay_ms))
    }

    /// Returns whether another retry should be attempted
    #[must_use]
    pub const fn should_retry(&self, attempt: u32) -> bool {
        self.enabled && attempt < self.max_attempts
    }

    /// Returns the total number of attempts (initial + retries)
    #[must_use]
    pub const fn total_attempts(&self) -> u32 {
        if self.enabled { self.max_attempts + 1 } else { 1 }
    }
}

/// State tracker for the connect attempts of one device
#[derive(Debug, Clone)]
pub struct RetryState {
    /// Current attempt number (0-indexed)
    current_attempt: u32,
    /// Configuration for retry behavior
    config: RetryConfig,
}

impl RetryState {
    /// Creates a new retry state with the given configuration
    #[must_use]
    pub const fn new(config: RetryConfig) -> Self {
        Self {
            current_attempt: 0,
            config,
        }
    }

    /// Returns the current attempt number (1-indexed, for display)
    #[must_use]
    pub const fn attempt_number(&self) -> u32 {
        self.current_attempt + 1
    }

    /// Returns the total number of attempts that will be made
    #[must_use]
    pub const fn total_attempts(&self) -> u32 {
        self.config.total_attempts()
    }

    /// Returns the delay before the next retry attempt
    #[must_use]
    pub fn next_delay(&self) -> Option<Duration> {
        self.config.delay_for_attempt(self.current_attempt)
    }

    /// Records a failed attempt and moves to the next one
    pub const fn record_failure(&mut self) {
        self.current_attempt += 1;
    }
}
