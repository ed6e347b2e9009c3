//! Error types for the shader harness core.

use thiserror::Error;

/// Errors produced by the non-GPU parts of the harness: mesh validation,
/// configuration and file discovery.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Width or height was zero.
    #[error("invalid dimensions: width and height must be non-zero")]
    InvalidDimensions,

    /// A mesh violated its index invariants.
    #[error("invalid mesh: {0}")]
    InvalidMesh(String),

    /// A filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(String),

    /// A configuration value was missing, malformed or out of range.
    #[error("invalid configuration: {0}")]
    Config(String),
}
