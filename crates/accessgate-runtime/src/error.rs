//! Runtime error types.

use thiserror::Error;

/// Errors raised while assembling the pipeline.
///
/// Processing itself never fails: every problem with a request becomes a
/// decision.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(#[from] accessgate_config::ConfigError),

    /// Guard construction error.
    #[error("Guard error: {0}")]
    GuardError(#[from] accessgate_guard::GuardError),

    /// Approval store error.
    #[error("Approval error: {0}")]
    ApprovalError(#[from] accessgate_approval::ApprovalError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
