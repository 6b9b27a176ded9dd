//! Error types for the static port allocation engine
//!
//! Uses `thiserror` for library errors. Every variant names the offending
//! service, port, or artifact file so callers never see a bare generic
//! failure.

use std::path::PathBuf;
use thiserror::Error;

use crate::catalog::Protocol;

/// Result type alias for engine operations
pub type PortResult<T> = Result<T, PortError>;

/// Main error type for engine operations
#[derive(Error, Debug)]
pub enum PortError {
    /// Unknown service name (or a protocol the service does not register)
    #[error("unknown rpcbind service '{service}'")]
    NotFound { service: String },

    /// Malformed value inside a configuration artifact
    #[error("malformed value '{value}' for key {key} in {}", .file.display())]
    ParseError {
        file: PathBuf,
        key: String,
        value: String,
    },

    /// Port outside the legal range for this service (includes a zero port
    /// for a service that may not be disabled)
    #[error("port {port} is out of range for service '{service}'")]
    OutOfRange { service: String, port: u16 },

    /// Port reserved by policy (ephemeral range, rpcbind itself, or the
    /// caller-supplied exclusion list)
    #[error("port {port} is reserved: {reason}")]
    ReservedPort { port: u16, reason: String },

    /// Port already assigned to another service on the same protocol
    #[error("port {port}/{protocol} is already assigned to service '{with_service}'")]
    Conflict {
        port: u16,
        protocol: Protocol,
        with_service: String,
    },

    /// Service does not accept a zero "disabled" port
    #[error("service '{service}' cannot be disabled")]
    CannotDisable { service: String },

    /// No free port left below 65536 for auto-assignment
    #[error("no free {protocol} port available in the static range")]
    RangeExhausted { protocol: Protocol },

    /// Malformed policy file
    #[error("invalid policy file {}: {message}", .file.display())]
    Policy { file: PathBuf, message: String },

    /// I/O failure on a configuration artifact
    #[error("I/O error on {}: {source}", .file.display())]
    Io {
        file: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Some artifact files were written before a failure; nothing is rolled
    /// back, the caller decides whether to retry or revert
    #[error("partial artifact write: applied {applied:?}, remaining {remaining:?}: {cause}")]
    PartialFailure {
        applied: Vec<PathBuf>,
        remaining: Vec<PathBuf>,
        #[source]
        cause: Box<PortError>,
    },

    /// Artifacts were written but the firewall collaborator failed to reload
    #[error("firewall reload failed: {message}")]
    FirewallReloadFailed { message: String },
}
