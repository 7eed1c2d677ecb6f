//! Domain error model.

use thiserror::Error;

/// Workspace-level domain error.
///
/// Business rule failures of a specific aggregate live in that aggregate's own
/// error type; this covers the shared primitives.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// An identifier could not be parsed.
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}
