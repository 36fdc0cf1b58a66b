//! Error types for the session layer.

/// Errors that can occur during session management.
///
/// These cover the full lifecycle of the player's identity:
/// authentication, restore from storage, refresh, and expiry.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Authentication failed: the backend rejected the device login
    /// (or the refresh exchange, when refreshing).
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The session is expired and could not be refreshed.
    /// The player must authenticate again.
    #[error("session expired")]
    Expired,

    /// No session exists. Operations that need an identity return this
    /// until `authenticate` has succeeded.
    #[error("not authenticated")]
    NoSession,

    /// A stored access token could not be decoded.
    /// Happens when storage is corrupted or written by something else.
    #[error("invalid session token: {0}")]
    InvalidToken(String),
}
