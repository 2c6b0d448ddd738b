//! Error types for the post cache
//!
//! Provides unified error handling using thiserror.
//!
//! Storage-medium errors never leave the cache. Remote-store errors surface
//! to the caller. Application errors carry the user-visible notice.

use thiserror::Error;

// == Storage Error Enum ==
/// Failure of the durable storage medium backing the cache.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Write rejected because the medium is full
    #[error("Storage quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Medium is disabled or cannot be reached
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Underlying file I/O failed
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Payload could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// == Store Error Enum ==
/// Failure reported by the remote document store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Network failure or server unreachable
    #[error("Network error: {0}")]
    Network(String),

    /// Caller lacks permission for the document
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Document does not exist
    #[error("Document not found: {0}")]
    NotFound(String),

    /// Document exists but its fields cannot be decoded
    #[error("Invalid document {path}: {message}")]
    InvalidDocument { path: String, message: String },
}

// == App Error Enum ==
/// Unified error type for application operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Operation requires a signed-in user
    #[error("Not authenticated: {0}")]
    NotAuthenticated(String),

    /// Submitted text was empty after trimming
    #[error("Empty content: {0}")]
    EmptyContent(String),

    /// Post is not part of the loaded listing
    #[error("Post not found: {0}")]
    PostNotFound(String),

    /// Action name is not in the dispatch table
    #[error("Unknown action: {0}")]
    UnknownAction(String),

    /// Action arguments do not match the action
    #[error("Invalid action arguments: {0}")]
    InvalidAction(String),

    /// Remote store failure
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AppError {
    // == User Message ==
    /// Returns the notice shown to the user for this error.
    ///
    /// Guard failures carry their own wording; everything coming from the
    /// remote store collapses into a generic retryable message.
    pub fn user_message(&self) -> String {
        match self {
            AppError::NotAuthenticated(msg) | AppError::EmptyContent(msg) => msg.clone(),
            AppError::PostNotFound(_) => "Post not found.".to_string(),
            AppError::UnknownAction(_) | AppError::InvalidAction(_) => {
                "Something went wrong. Please try again.".to_string()
            }
            AppError::Store(_) => "Request failed. Please try again.".to_string(),
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for application operations.
pub type Result<T> = std::result::Result<T, AppError>;
