//! Session error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Cannot destroy the default session")]
    CannotDestroyDefaultSession,

    #[error("Session already destroyed: {0}")]
    AlreadyDestroyed(String),

    #[error("Failed to destroy session {id}: {reason}")]
    DestroyFailed { id: String, reason: String },

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Storage error: {0}")]
    Storage(#[from] keel_storage::StorageError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
