//! Pre-connect TCP port check
//!
//! Gives fast feedback for unreachable hosts before spawning `ssh`.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

/// Error type for port check operations
#[derive(Debug, Error)]
pub enum PortCheckError {
    /// Host resolution failed
    #[error("Failed to resolve host '{host}': {reason}")]
    ResolutionFailed {
        /// The hostname that failed to resolve
        host: String,
        /// The reason for the failure
        reason: String,
    },
    /// Connection refused or timed out
    #[error("Port {port} on '{host}' is not reachable: {reason}")]
    Unreachable {
        /// The hostname that was unreachable
        host: String,
        /// The port that was unreachable
        port: u16,
        /// The reason for the failure
        reason: String,
    },
}

/// Checks that a TCP port accepts connections
///
/// Every resolved address is tried in turn, each with the full timeout.
///
/// # Errors
///
/// * `PortCheckError::ResolutionFailed` if the hostname cannot be resolved
/// * `PortCheckError::Unreachable` if no address accepted the connection
pub async fn check_port(host: &str, port: u16, timeout: Duration) -> Result<(), PortCheckError> {
    let addrs: Vec<SocketAddr> = tokio::net::lookup_host((host, port))
        .await
        .map_err(|e| PortCheckError::ResolutionFailed {
            host: host.to_string(),
            reason: e.to_string(),
        })?
        .collect();

    if addrs.is_empty() {
        return Err(PortCheckError::ResolutionFailed {
            host: host.to_string(),
            reason: "No addresses found".to_string(),
        });
    }

    let mut last_error = String::new();
    for addr in addrs {
        match tokio::time::timeout(timeout, tokio::net::TcpStream::connect(addr)).await {
            Ok(Ok(_stream)) => return Ok(()),
            Ok(Err(e)) => last_error = e.to_string(),
            Err(_) => last_error = "Connection timed out".to_string(),
        }
    }

    Err(PortCheckError::Unreachable {
        host: host.to_string(),
        port,
        reason: last_error,
    })
}
