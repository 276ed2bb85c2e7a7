//! Core error types.

use thiserror::Error;

/// Errors raised while constructing or validating core types.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An inbound request was missing a required field.
    #[error("invalid request {id}: {reason}")]
    InvalidRequest {
        /// The request identifier (may be empty if that was the problem).
        id: String,
        /// What was wrong with it.
        reason: String,
    },

    /// An action type string could not be recognized.
    #[error("unrecognized action type: {0}")]
    UnknownActionType(String),
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
