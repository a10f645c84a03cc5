//! Error types shared by the value model, the differ and the patcher.

use thiserror::Error;

/// Errors raised while resolving paths or mutating values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DocError {
    /// A key path segment does not exist on the value it was applied to.
    #[error("Path not found: {0}")]
    PathNotFound(String),

    /// A change record does not fit the live value it is replayed against.
    #[error("Patch inconsistency at {path}: {reason}")]
    PatchInconsistency { path: String, reason: String },

    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    /// A character position outside the live text.
    #[error("Text position {index} out of bounds (length: {length})")]
    TextOutOfBounds { index: usize, length: usize },

    #[error("Invalid path segment: {0}")]
    InvalidPath(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl DocError {
    pub fn inconsistency(path: impl ToString, reason: impl Into<String>) -> Self {
        DocError::PatchInconsistency {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for DocError {
    fn from(err: serde_json::Error) -> Self {
        DocError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DocError>;
