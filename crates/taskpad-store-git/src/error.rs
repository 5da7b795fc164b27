//! Error types for Git-backed document collections.

use thiserror::Error;

/// Errors that can occur during `GitCollection` operations.
#[derive(Error, Debug)]
pub enum GitCollectionError {
    /// Collection names become ref path components and must be simple.
    #[error("Invalid collection name: {0:?}")]
    InvalidCollection(String),

    /// Git repository error.
    #[error("Git repository error: {0}")]
    Git(#[from] git2::Error),

    /// Failed to parse a stored document.
    #[error("Failed to parse document in commit {oid}: {source}")]
    Parse {
        /// Commit holding the document.
        oid: String,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// Failed to serialize a document to JSON.
    #[error("Failed to serialize document: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Other unclassified error.
    #[error("Other error: {0}")]
    Other(String),
}

/// Result alias for collection operations.
pub type Result<T> = std::result::Result<T, GitCollectionError>;
