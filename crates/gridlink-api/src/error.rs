//! Error types for the HTTP backend.

/// Errors surfaced by backend calls.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a usable response: connection
    /// failure, or a body that couldn't be read or parsed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend answered with a non-success status. `message` is the
    /// backend's `error` field when it sent one, otherwise the status
    /// line's reason.
    #[error("server returned {code}: {message}")]
    Status { code: u16, message: String },
}
