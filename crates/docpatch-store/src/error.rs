//! Error types for the store and URI layers.

use docpatch_core::DocError;
use thiserror::Error;

/// Reasons a string is not a document URI.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UriError {
    #[error("Unknown scheme: {0}")]
    UnknownScheme(String),

    #[error("Missing scheme in {0}")]
    MissingScheme(String),

    #[error("Missing document id in {0}")]
    MissingDocumentId(String),

    #[error("Invalid percent escape in {0}")]
    InvalidEscape(String),
}

/// Errors that can occur in store and gateway operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("History index {requested} out of range for {doc_id} (retained {oldest}..={latest})")]
    HistoryOutOfRange {
        doc_id: String,
        requested: usize,
        oldest: usize,
        latest: usize,
    },

    #[error("Cannot write through a historical URI: {0}")]
    ReadOnlySnapshot(String),

    #[error("Not a document URI: {0}")]
    NotADocumentUri(String),

    #[error("Content is not an object: {0}")]
    NotAnObject(String),

    #[error("Invalid content: {0}")]
    InvalidContent(String),

    #[error("Document root must stay an object: {0}")]
    RootNotObject(String),

    #[error(transparent)]
    Doc(#[from] DocError),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
