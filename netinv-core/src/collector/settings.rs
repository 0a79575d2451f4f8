//! Run-wide timeouts and retry policy

use std::time::Duration;

use super::retry::RetryConfig;

/// Default timeout for opening and authenticating a session (seconds)
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default timeout for one command (seconds)
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 30;

/// Default overall deadline per device (seconds)
pub const DEFAULT_DEVICE_TIMEOUT_SECS: u64 = 180;

/// Longest timeout accepted from configuration or flags (one day)
pub const MAX_TIMEOUT_SECS: u64 = 86_400;

/// Default number of devices processed in parallel
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Settings shared by every worker of a run
#[derive(Debug, Clone, PartialEq)]
pub struct CollectorSettings {
    /// Timeout for each connect attempt
    pub connect_timeout: Duration,
    /// Timeout for each command without its own timeout
    pub command_timeout: Duration,
    /// Overall deadline per device unless the target overrides it
    pub device_timeout: Duration,
    /// Connect retry policy
    pub retry: RetryConfig,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            command_timeout: Duration::from_secs(DEFAULT_COMMAND_TIMEOUT_SECS),
            device_timeout: Duration::from_secs(DEFAULT_DEVICE_TIMEOUT_SECS),
            retry: RetryConfig::default(),
        }
    }
}

impl CollectorSettings {
    /// Creates settings with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the connect timeout
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the command timeout
    #[must_use]
    pub const fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Sets the per-device deadline
    #[must_use]
    pub const fn with_device_timeout(mut self, timeout: Duration) -> Self {
        self.device_timeout = timeout;
        self
    }

    /// Sets the retry policy
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}
