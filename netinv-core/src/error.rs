//! Run-level error types
//!
//! Per-device problems never surface here; they end up as
//! [`crate::models::DeviceFailure`] values inside the aggregate. The errors
//! in this module reject a whole run before any device is contacted.

use thiserror::Error;

use crate::config::ConfigError;
use crate::models::DeviceId;
use crate::report::ReportError;
use crate::tracing::TracingError;
use crate::vendor::RegistryError;

/// Errors that abort a collection run before dispatch
#[derive(Debug, Error)]
pub enum CollectionError {
    /// No targets were submitted
    #[error("Target list is empty")]
    EmptyTargets,

    /// Concurrency limit must be at least one
    #[error("Invalid concurrency limit: {0} (must be at least 1)")]
    InvalidConcurrency(usize),

    /// The same device identity was submitted twice
    #[error("Duplicate device identity: {0}")]
    DuplicateTarget(DeviceId),

    /// A target references a credential that was not supplied
    #[error("Device {device} references unknown credential '{credential}'")]
    MissingCredential {
        /// Offending device
        device: DeviceId,
        /// Credential reference name
        credential: String,
    },

    /// Vendor profiles could not be prepared
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Result type for run-level operations
pub type CollectionResult<T> = Result<T, CollectionError>;

/// Any error the library can return to an application
#[derive(Debug, Error)]
pub enum NetinvError {
    /// Inventory file problem
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Run rejected before dispatch
    #[error(transparent)]
    Collection(#[from] CollectionError),

    /// Report could not be written
    #[error(transparent)]
    Report(#[from] ReportError),

    /// Logging could not be set up
    #[error(transparent)]
    Tracing(#[from] TracingError),
}

impl From<RegistryError> for NetinvError {
    fn from(err: RegistryError) -> Self {
        Self::Collection(CollectionError::Registry(err))
    }
}
