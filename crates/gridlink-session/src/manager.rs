//! The session manager: owns the current session and its persistence.
//!
//! This is the central piece of the session layer. It's responsible
//! for:
//! - Restoring a session from stored tokens at startup
//! - Authenticating when there is nothing to restore
//! - Refreshing the session before it expires
//! - Keeping the credential store in sync with the in-memory session
//!
//! ## Lifecycle
//!
//! ```text
//! restore() ──(usable tokens)──→ [Session] ←── authenticate()
//!                                    │
//!                  ensure_valid() ───┤ (expires within horizon)
//!                                    ▼
//!                                refresh() ──(rejected)──→ [None] + storage cleared
//!                                    │
//!                                    └──(ok)──→ [Session] + storage updated
//! ```
//!
//! # Concurrency note
//!
//! `SessionManager` is NOT thread-safe by itself. The client wraps it in
//! an async mutex and holds the lock across `ensure_valid`, which is
//! what collapses concurrent refresh attempts into one request. Keeping
//! the manager itself lock-free avoids hidden double-locking.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::{AuthApi, CredentialStore, Session, SessionError};

/// Owns the current session (at most one) and the store it persists to.
pub struct SessionManager<S> {
    store: S,
    session: Option<Session>,
}

impl<S: CredentialStore> SessionManager<S> {
    /// Creates a manager with no session. Call [`restore`] to pick up a
    /// persisted one.
    ///
    /// [`restore`]: SessionManager::restore
    pub fn new(store: S) -> Self {
        Self {
            store,
            session: None,
        }
    }

    /// Restores the session persisted by a previous run.
    ///
    /// Purely local, no network. Stored tokens that cannot be decoded,
    /// or that expire within [`SESSION_EXPIRY_HORIZON`], are discarded
    /// together with their stored copy; the next `authenticate` starts
    /// fresh.
    ///
    /// [`SESSION_EXPIRY_HORIZON`]: crate::SESSION_EXPIRY_HORIZON
    pub fn restore(&mut self) {
        let credentials = match self.store.load() {
            Ok(Some(credentials)) => credentials,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!(error = %e, "failed to load stored credentials");
                return;
            }
        };

        match Session::restore(&credentials.access_token, &credentials.refresh_token) {
            Ok(session) if session.expires_soon() => {
                tracing::info!("stored session expires soon, discarding");
                self.clear_stored();
            }
            Ok(session) => {
                tracing::info!(user_id = %session.user_id, "session restored");
                self.session = Some(session);
            }
            Err(e) => {
                tracing::warn!(error = %e, "stored session is unusable, discarding");
                self.clear_stored();
            }
        }
    }

    /// Authenticates with the backend and installs the resulting
    /// session.
    ///
    /// Builds a fresh device id for the attempt, registers the account
    /// when it doesn't exist, and persists the new tokens. On failure
    /// stored credentials are cleared (they describe an identity the
    /// backend just refused) but a previously working in-memory session
    /// is left in place.
    pub async fn authenticate<A: AuthApi>(
        &mut self,
        api: &A,
        username: &str,
    ) -> Result<&Session, SessionError> {
        let device_id = device_id_for(username);
        let response = match api.authenticate_device(&device_id, true, username).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "authentication failed");
                self.clear_stored();
                return Err(e);
            }
        };

        let session = Session::from(response);
        tracing::info!(user_id = %session.user_id, username = %session.username, "authenticated");
        self.session = Some(session);
        self.persist();

        // `expect` is safe: the line above just set the session.
        Ok(self.session.as_ref().expect("just set"))
    }

    /// Exchanges the refresh token for a fresh session.
    ///
    /// On success the new session replaces the old one, in memory and
    /// on disk. On failure everything is cleared: a refresh token the
    /// backend rejects will not start working later, so keeping it
    /// would only repeat the failure.
    ///
    /// # Errors
    /// - [`SessionError::NoSession`]: nothing to refresh
    /// - [`SessionError::Expired`]: the backend rejected the exchange
    pub async fn refresh<A: AuthApi>(&mut self, api: &A) -> Result<&Session, SessionError> {
        let refresh_token = match &self.session {
            Some(session) => session.refresh_token.clone(),
            None => return Err(SessionError::NoSession),
        };

        match api.session_refresh(&refresh_token).await {
            Ok(response) => {
                let session = Session::from(response);
                tracing::info!(user_id = %session.user_id, "session refreshed");
                self.session = Some(session);
                self.persist();
                Ok(self.session.as_ref().expect("just set"))
            }
            Err(e) => {
                tracing::warn!(error = %e, "session refresh failed");
                self.session = None;
                self.clear_stored();
                Err(SessionError::Expired)
            }
        }
    }

    /// Returns a session guaranteed to outlive the next backend call,
    /// refreshing first when the current one expires within the
    /// horizon.
    ///
    /// Every authenticated operation goes through here, so expiry is
    /// handled in exactly one place.
    pub async fn ensure_valid<A: AuthApi>(&mut self, api: &A) -> Result<&Session, SessionError> {
        let needs_refresh = match &self.session {
            None => return Err(SessionError::NoSession),
            Some(session) => session.expires_soon(),
        };

        if needs_refresh {
            self.refresh(api).await
        } else {
            self.session.as_ref().ok_or(SessionError::NoSession)
        }
    }

    /// The current session, if any. No validity check.
    pub fn current(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// `true` when a session exists and its access token hasn't
    /// expired yet.
    pub fn is_authenticated(&self) -> bool {
        self.session.as_ref().is_some_and(|s| !s.is_expired())
    }

    /// Forgets the session, in memory and on disk.
    pub fn logout(&mut self) {
        self.session = None;
        self.clear_stored();
        tracing::info!("logged out");
    }

    /// Writes the current session's tokens to the store. Persistence is
    /// best effort: the in-memory session stays authoritative.
    fn persist(&self) {
        let Some(session) = &self.session else { return };
        if let Err(e) = self.store.save(&session.credentials()) {
            tracing::warn!(error = %e, "failed to persist credentials");
        }
    }

    fn clear_stored(&self) {
        if let Err(e) = self.store.clear() {
            tracing::warn!(error = %e, "failed to clear stored credentials");
        }
    }
}

/// Derives the device identifier for one login attempt.
///
/// The backend keys device accounts by this string. Combining the
/// username with the current time keeps two players on the same machine
/// from colliding. Capped at 128 characters (a common backend limit)
/// without splitting a multi-byte character.
fn device_id_for(username: &str) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let id = format!("device-{username}-{millis}");
    id.chars().take(128).collect()
}

// =========================================================================
// Tests
// =========================================================================
