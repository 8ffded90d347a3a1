//! Platform error types.

/// Result type for platform calls.
pub type PlatformResult<T> = Result<T, PlatformError>;

/// Errors from platform calls.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlatformError {
    /// The remote call failed.
    #[error("platform request failed: {0}")]
    Request(String),

    /// The remote call did not complete in time.
    #[error("platform request timed out")]
    Timeout,

    /// The platform rejected the request.
    #[error("platform rejected request: {0}")]
    Rejected(String),
}
