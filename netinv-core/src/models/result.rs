//! Per-device outcomes
//!
//! Every target submitted to a run ends up as exactly one [`DeviceResult`],
//! either carrying an [`InventoryRecord`] or a typed [`DeviceFailure`].

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::inventory::InventoryRecord;
use super::target::DeviceId;

/// Phase of device processing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Waiting for a worker slot (never started)
    Queued,
    /// Opening the TCP/SSH connection
    Connect,
    /// Login and privilege elevation
    Authenticate,
    /// Vendor detection from banner or detection command output
    Detect,
    /// Running inventory commands
    Command,
    /// Parsing captured output
    Parse,
}

impl Stage {
    /// Compact numeric form used by the in-flight stage tracker
    pub(crate) const fn as_u8(self) -> u8 {
        match self {
            Self::Queued => 0,
            Self::Connect => 1,
            Self::Authenticate => 2,
            Self::Detect => 3,
            Self::Command => 4,
            Self::Parse => 5,
        }
    }

    pub(crate) const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Queued,
            1 => Self::Connect,
            2 => Self::Authenticate,
            3 => Self::Detect,
            4 => Self::Command,
            _ => Self::Parse,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Queued => write!(f, "queued"),
            Self::Connect => write!(f, "connect"),
            Self::Authenticate => write!(f, "authenticate"),
            Self::Detect => write!(f, "detect"),
            Self::Command => write!(f, "command"),
            Self::Parse => write!(f, "parse"),
        }
    }
}

/// Failure taxonomy for a single device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Host unreachable, refused, or SSH negotiation failed
    ConnectError,
    /// Credentials or enable secret rejected
    AuthError,
    /// No response to a command within its timeout
    CommandTimeout,
    /// Session dropped unexpectedly
    TransportError,
    /// Output did not match the vendor grammar
    ParseError,
    /// No adapter matched and the generic fallback found nothing
    UnsupportedVendor,
    /// Run cancelled before or during processing
    Cancelled,
    /// Overall per-device deadline exceeded
    Timeout,
    /// Worker task terminated abnormally
    Internal,
}

impl FailureKind {
    /// Returns true for failures caused by the caller rather than the device
    #[must_use]
    pub const fn is_cancellation(self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ConnectError => "ConnectError",
            Self::AuthError => "AuthError",
            Self::CommandTimeout => "CommandTimeout",
            Self::TransportError => "TransportError",
            Self::ParseError => "ParseError",
            Self::UnsupportedVendor => "UnsupportedVendor",
            Self::Cancelled => "Cancelled",
            Self::Timeout => "Timeout",
            Self::Internal => "Internal",
        };
        f.write_str(name)
    }
}

/// Typed failure with the stage it happened in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceFailure {
    /// Failure category
    pub kind: FailureKind,
    /// Human readable detail (never contains secrets)
    pub message: String,
    /// Stage that failed
    pub stage: Stage,
}

impl DeviceFailure {
    /// Creates a failure
    #[must_use]
    pub fn new(kind: FailureKind, stage: Stage, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            stage,
        }
    }
}

impl fmt::Display for DeviceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} during {}: {}", self.kind, self.stage, self.message)
    }
}

/// Success or failure of one device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DeviceOutcome {
    /// Inventory collected and parsed
    Success(InventoryRecord),
    /// Processing stopped at some stage
    Failure(DeviceFailure),
}

/// Coarse outcome used by progress events and summaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutcomeKind {
    /// Device succeeded
    Success,
    /// Device failed with the given kind
    Failure(FailureKind),
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "Success"),
            Self::Failure(kind) => write!(f, "{kind}"),
        }
    }
}

/// Final result for one target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceResult {
    /// Target identity
    pub device: DeviceId,
    /// Host the worker talked to
    pub host: String,
    /// Success or failure
    pub outcome: DeviceOutcome,
    /// Wall time spent on this device in milliseconds
    pub elapsed_ms: u64,
    /// Completion time
    pub finished_at: DateTime<Utc>,
}

impl DeviceResult {
    /// Creates a successful result
    #[must_use]
    pub fn success(device: DeviceId, host: impl Into<String>, record: InventoryRecord, elapsed: Duration) -> Self {
        Self {
            device,
            host: host.into(),
            outcome: DeviceOutcome::Success(record),
            elapsed_ms: elapsed.as_millis() as u64,
            finished_at: Utc::now(),
        }
    }

    /// Creates a failed result
    #[must_use]
    pub fn failure(device: DeviceId, host: impl Into<String>, failure: DeviceFailure, elapsed: Duration) -> Self {
        Self {
            device,
            host: host.into(),
            outcome: DeviceOutcome::Failure(failure),
            elapsed_ms: elapsed.as_millis() as u64,
            finished_at: Utc::now(),
        }
    }

    /// Result for a target that never got a worker slot
    #[must_use]
    pub fn cancelled_before_start(device: DeviceId, host: impl Into<String>) -> Self {
        Self::failure(
            device,
            host,
            DeviceFailure::new(FailureKind::Cancelled, Stage::Queued, "Run cancelled before device was started"),
            Duration::ZERO,
        )
    }

    /// Returns true on success
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.outcome, DeviceOutcome::Success(_))
    }

    /// Returns true on failure
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        !self.is_success()
    }

    /// Inventory record, if collection succeeded
    #[must_use]
    pub const fn record(&self) -> Option<&InventoryRecord> {
        match &self.outcome {
            DeviceOutcome::Success(record) => Some(record),
            DeviceOutcome::Failure(_) => None,
        }
    }

    /// Failure details, if collection failed
    #[must_use]
    pub const fn failure_details(&self) -> Option<&DeviceFailure> {
        match &self.outcome {
            DeviceOutcome::Success(_) => None,
            DeviceOutcome::Failure(failure) => Some(failure),
        }
    }

    /// Coarse outcome kind
    #[must_use]
    pub const fn outcome_kind(&self) -> OutcomeKind {
        match &self.outcome {
            DeviceOutcome::Success(_) => OutcomeKind::Success,
            DeviceOutcome::Failure(failure) => OutcomeKind::Failure(failure.kind),
        }
    }

    /// Elapsed time as a `Duration`
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms)
    }
}
