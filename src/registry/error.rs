//! Relay error types
//!
//! Every request-affecting failure of the core is one of these. Fan-out
//! failures to individual subscribers are never reported through this type.

use thiserror::Error;

/// Error type for registry and relay operations
#[derive(Debug, Error)]
pub enum RelayError {
    /// A required field was missing or empty
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    /// A tunnel with this ID already exists
    #[error("tunnel already exists: {0}")]
    AlreadyExists(String),
    /// No tunnel with this ID exists
    #[error("tunnel not found: {0}")]
    NotFound(String),
    /// Response serialization failed
    #[error("encoding failure: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl RelayError {
    /// Whether this error names a missing tunnel
    pub fn is_not_found(&self) -> bool {
        matches!(self, RelayError::NotFound(_))
    }
}
