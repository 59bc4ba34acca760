//! Crate-level error type

use thiserror::Error;

use crate::registry::RelayError;

/// Errors raised while starting or running the server
#[derive(Debug, Error)]
pub enum Error {
    /// Socket or listener failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Relay setup failure
    #[error(transparent)]
    Relay(#[from] RelayError),
}

/// Result alias using the crate error type
pub type Result<T> = std::result::Result<T, Error>;
