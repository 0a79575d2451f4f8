//! Session transport
//!
//! A [`Transport`] opens one authenticated CLI session per device; a
//! [`Session`] sends commands and returns their cleaned text output. The
//! worker owns the session and closes it exactly once on every path.

mod port_check;
mod ssh;

use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use secrecy::SecretString;
use thiserror::Error;

use crate::models::{Credential, DeviceTarget};

pub use port_check::{PortCheckError, check_port};
pub use ssh::{SshSession, SshSettings, SshTransport};

/// Deadline used when `now + timeout` does not fit in an [`Instant`](tokio::time::Instant)
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Instant `timeout` from now, saturating instead of overflowing
pub(crate) fn deadline_after(timeout: Duration) -> tokio::time::Instant {
    let now = tokio::time::Instant::now();
    now.checked_add(timeout).unwrap_or(now + FAR_FUTURE)
}

/// Errors raised by transports and sessions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Host unreachable, refused, or SSH negotiation failed
    #[error("Connection to {host}:{port} failed: {reason}")]
    Connect {
        /// Target host
        host: String,
        /// Target port
        port: u16,
        /// Failure detail
        reason: String,
    },
    /// Credentials or enable secret rejected
    #[error("Authentication failed for {username}@{host}: {reason}")]
    Auth {
        /// Target host
        host: String,
        /// Login user
        username: String,
        /// Failure detail
        reason: String,
    },
    /// The device did not return a prompt in time
    #[error("Command '{command}' timed out after {}s", timeout.as_secs())]
    CommandTimeout {
        /// Command text
        command: String,
        /// Timeout that expired
        timeout: Duration,
    },
    /// The session dropped while a command was running
    #[error("Session closed unexpectedly: {0}")]
    Disconnected(String),
    /// Local I/O failure talking to the session process
    #[error("I/O error: {0}")]
    Io(String),
}

impl TransportError {
    /// Returns true if another connection attempt may succeed
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Connect { .. })
    }
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// Opens sessions to devices
#[async_trait]
pub trait Transport: Send + Sync {
    /// Connects and authenticates
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Connect`] or [`TransportError::Auth`]; no
    /// command has been sent when this fails.
    async fn open(
        &self,
        target: &DeviceTarget,
        credential: &Credential,
        timeout: Duration,
    ) -> TransportResult<Box<dyn Session>>;
}

/// One open CLI session
#[async_trait]
pub trait Session: Send {
    /// Text received before the first prompt
    fn banner(&self) -> &str;

    /// Most recent prompt line
    fn prompt(&self) -> &str;

    /// Replaces the prompt matcher once the vendor is known
    fn set_prompt_pattern(&mut self, pattern: Regex);

    /// Runs one command and returns its output without echo and prompt
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::CommandTimeout`] if no prompt arrives in
    /// time, or [`TransportError::Disconnected`] if the session dropped.
    async fn run(&mut self, command: &str, timeout: Duration) -> TransportResult<String>;

    /// Enters privileged mode
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Auth`] if the secret is rejected.
    async fn enable(&mut self, command: &str, secret: &SecretString, timeout: Duration) -> TransportResult<()>;

    /// Closes the session
    async fn close(self: Box<Self>);
}
