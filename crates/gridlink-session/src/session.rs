//! Session types: the client's record of who is signed in.
//!
//! A session tracks:
//! - WHO the player is (`user_id`, `username`)
//! - WHAT proves it (the access token, a JWT)
//! - HOW to extend it (the refresh token)
//! - WHEN it stops working (`expires_at`)

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use gridlink_protocol::AuthResponse;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use crate::{Credentials, SessionError};

/// How close to expiry a session may get before it is treated as
/// unusable.
///
/// One horizon everywhere: restore discards stored sessions inside it,
/// and `ensure_valid` refreshes before it is crossed. Five minutes is
/// comfortably longer than any single backend call, so a session handed
/// out by the manager stays valid for the operation it was fetched for.
pub const SESSION_EXPIRY_HORIZON: Duration = Duration::from_secs(5 * 60);

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// The signed-in player's identity and tokens.
///
/// Created from an [`AuthResponse`] after authenticating, or restored
/// from stored tokens at startup. Immutable once built: refresh replaces
/// the whole session rather than patching fields.
#[derive(Debug, Clone)]
pub struct Session {
    /// The player's server-assigned id.
    pub user_id: String,

    /// The player's display name.
    pub username: String,

    /// Unix timestamp (seconds) when the access token stops working.
    pub expires_at: u64,

    /// The JWT presented on every authenticated call.
    pub access_token: String,

    /// The long-lived token exchanged for a new session on refresh.
    pub refresh_token: String,
}

/// The claims the backend puts in an access token's payload.
///
/// `usn` defaults to empty rather than failing the decode: the token is
/// still a usable identity without a display name.
#[derive(Debug, Deserialize)]
struct TokenClaims {
    uid: String,
    #[serde(default)]
    usn: String,
    exp: u64,
}

impl From<AuthResponse> for Session {
    fn from(response: AuthResponse) -> Self {
        Self {
            user_id: response.user_id,
            username: response.username,
            expires_at: response.expires_at,
            access_token: response.access_token,
            refresh_token: response.refresh_token,
        }
    }
}

impl Session {
    /// Rebuilds a session from a stored token pair.
    ///
    /// The identity and expiry are read out of the access token's JWT
    /// claims. The signature is NOT verified: the signing key lives on
    /// the server, and a forged token would only let a client lie to
    /// itself. The server re-checks the signature on every call.
    pub fn restore(access_token: &str, refresh_token: &str) -> Result<Self, SessionError> {
        let claims = decode_claims(access_token)?;
        Ok(Self {
            user_id: claims.uid,
            username: claims.usn,
            expires_at: claims.exp,
            access_token: access_token.to_string(),
            refresh_token: refresh_token.to_string(),
        })
    }

    /// Returns `true` if the access token expires at or before
    /// `deadline` (Unix seconds).
    ///
    /// The boundary is inclusive: a token expiring exactly at the
    /// deadline is already useless for a call made at the deadline.
    pub fn expires_before(&self, deadline: u64) -> bool {
        self.expires_at <= deadline
    }

    /// Returns `true` if the access token is expired right now.
    pub fn is_expired(&self) -> bool {
        self.expires_before(unix_now())
    }

    /// Returns `true` if the token expires within
    /// [`SESSION_EXPIRY_HORIZON`] from now.
    pub fn expires_soon(&self) -> bool {
        self.expires_before(unix_now() + SESSION_EXPIRY_HORIZON.as_secs())
    }

    /// The token pair to persist for this session.
    pub fn credentials(&self) -> Credentials {
        Credentials {
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
        }
    }
}

/// Decodes the claims out of an access token without verifying it.
fn decode_claims(token: &str) -> Result<TokenClaims, SessionError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    // Expiry is checked through `expires_before`, not at decode time:
    // an expired-but-well-formed token still identifies whose refresh
    // token sits next to it.
    validation.validate_exp = false;
    let data = jsonwebtoken::decode::<TokenClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map_err(|e| SessionError::InvalidToken(e.to_string()))?;
    Ok(data.claims)
}

/// Current Unix time in seconds. A system clock before the epoch reads
/// as zero.
pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

// =========================================================================
// Tests
// =========================================================================
