/// Errors raised by the approval layer.
#[derive(Debug, thiserror::Error)]
pub enum ApprovalError {
    /// The spending window is zero or negative.
    #[error("invalid spending window: {0}")]
    InvalidWindow(String),
}

/// Result type for approval operations.
pub type ApprovalResult<T> = Result<T, ApprovalError>;
