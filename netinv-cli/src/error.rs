//! CLI error types and exit codes.

use netinv_core::NetinvError;

/// Exit codes for CLI operations
pub mod exit_codes {
    /// General error - configuration, validation, or I/O errors
    pub const GENERAL_ERROR: i32 = 1;
    /// The run finished but at least one device failed
    pub const DEVICE_FAILURE: i32 = 2;
    /// The run was interrupted with Ctrl-C
    pub const CANCELLED: i32 = 130;
}

/// CLI error type
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Inventory could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// Run rejected before any device was contacted
    #[error("Collection error: {0}")]
    Collection(String),

    /// Report could not be written
    #[error("Report error: {0}")]
    Report(String),

    /// Logging could not be set up
    #[error("Logging error: {0}")]
    Logging(String),

    /// Some devices failed
    #[error("{failed} of {total} devices failed")]
    DevicesFailed {
        /// Failed devices
        failed: usize,
        /// Devices in the run
        total: usize,
    },

    /// Run interrupted by the user
    #[error("Collection cancelled")]
    Cancelled,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<NetinvError> for CliError {
    fn from(err: NetinvError) -> Self {
        match err {
            NetinvError::Config(e) => Self::Config(e.to_string()),
            NetinvError::Collection(e) => Self::Collection(e.to_string()),
            NetinvError::Report(e) => Self::Report(e.to_string()),
            NetinvError::Tracing(e) => Self::Logging(e.to_string()),
        }
    }
}

impl From<netinv_core::ConfigError> for CliError {
    fn from(err: netinv_core::ConfigError) -> Self {
        NetinvError::from(err).into()
    }
}

impl From<netinv_core::CollectionError> for CliError {
    fn from(err: netinv_core::CollectionError) -> Self {
        NetinvError::from(err).into()
    }
}

impl From<netinv_core::ReportError> for CliError {
    fn from(err: netinv_core::ReportError) -> Self {
        NetinvError::from(err).into()
    }
}

impl CliError {
    /// Returns the appropriate exit code for this error type.
    ///
    /// Exit codes:
    /// - 0: Success (not an error)
    /// - 1: General error (configuration, validation, report, IO)
    /// - 2: At least one device failed
    /// - 130: Cancelled with Ctrl-C
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::DevicesFailed { .. } => exit_codes::DEVICE_FAILURE,
            Self::Cancelled => exit_codes::CANCELLED,
            Self::Config(_) | Self::Collection(_) | Self::Report(_) | Self::Logging(_) | Self::Io(_) => {
                exit_codes::GENERAL_ERROR
            }
        }
    }
}
