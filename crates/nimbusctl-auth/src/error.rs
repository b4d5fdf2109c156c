//! Error types for authentication operations.

use thiserror::Error;

/// Errors that can occur during authentication operations.
///
/// None of these are retried inside the subsystem; they propagate to the
/// command layer. An invalid credentials file is the one exception: the gate
/// treats it the same as a missing file and re-authenticates.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Interactive auth attempted in a non-interactive context.
    #[error(
        "Cannot run interactive auth in CI. \
         Provide an API key or pass --force-auth to run the browser flow anyway"
    )]
    CiBlocked,

    /// The browser for the interactive flow could not be opened.
    #[error("Failed to open web browser. Please try again.")]
    Browser,

    /// The refresh call was rejected (expired/revoked refresh token or
    /// network failure).
    #[error("Failed to refresh token: {0}. Run `nimbusctl auth login` to log in again")]
    RefreshFailed(String),

    /// A freshly obtained token could not be used to retrieve identity.
    #[error("Token validation failed: {0}")]
    ValidationFailed(String),

    /// The credentials file exists but is not valid JSON.
    #[error("Invalid credentials file at {path}: {message}")]
    Parse { path: String, message: String },

    /// The interactive login did not complete (callback error, timeout,
    /// token exchange rejected).
    #[error("Login failed: {0}")]
    LoginFailed(String),

    /// Failed to read or write the credentials file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to serialize auth data.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for auth operations.
pub type AuthResult<T> = Result<T, AuthError>;
