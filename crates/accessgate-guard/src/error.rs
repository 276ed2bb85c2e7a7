//! Guard error types.

use thiserror::Error;

/// Errors raised while building guards.
#[derive(Debug, Error)]
pub enum GuardError {
    /// A detection signature failed to compile.
    #[error("invalid injection signature '{name}': {source}")]
    InvalidPattern {
        /// Signature name.
        name: String,
        /// Regex compilation error.
        #[source]
        source: regex::Error,
    },
}

/// Result type for guard operations.
pub type GuardResult<T> = Result<T, GuardError>;
