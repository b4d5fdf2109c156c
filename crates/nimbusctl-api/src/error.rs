//! Error types for API operations.

use thiserror::Error;

/// Errors that can occur while talking to the control plane.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure (DNS, TLS, connection).
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("API returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body could not be decoded.
    #[error("invalid API response: {0}")]
    Decode(String),
}

/// Result type for API operations.
pub type ApiResult<T> = Result<T, ApiError>;
