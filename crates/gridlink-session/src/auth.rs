//! Authentication hook: how the session layer reaches the auth backend.
//!
//! The session layer decides WHEN to authenticate or refresh; it does
//! not know how to speak HTTP. [`AuthApi`] is the seam between the two:
//! `gridlink-api` implements it against the real backend, and tests
//! implement it with canned responses. The session logic is identical
//! either way.

use gridlink_protocol::AuthResponse;

use crate::SessionError;

/// The authentication calls the session layer depends on.
///
/// # Trait bounds
///
/// - `Send + Sync` → the backend is shared across async tasks.
/// - `'static` → it doesn't borrow temporary data; it lives as long as
///   the client that owns it.
///
/// # Why `impl Future` instead of `async fn`?
///
/// Session operations run inside spawned tasks, so the futures these
/// methods return must be `Send`. Writing the return type out lets the
/// trait require that; implementors still just write `async fn`.
pub trait AuthApi: Send + Sync + 'static {
    /// Authenticates with a device identifier.
    ///
    /// # Arguments
    /// - `device_id`: the opaque per-login identifier
    /// - `create`: register the account if it doesn't exist yet
    /// - `username`: the display name to attach to the account
    fn authenticate_device(
        &self,
        device_id: &str,
        create: bool,
        username: &str,
    ) -> impl std::future::Future<Output = Result<AuthResponse, SessionError>> + Send;

    /// Exchanges a refresh token for a fresh session.
    fn session_refresh(
        &self,
        refresh_token: &str,
    ) -> impl std::future::Future<Output = Result<AuthResponse, SessionError>> + Send;
}
