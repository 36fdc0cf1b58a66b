//! The real backend client, speaking JSON over HTTP with `reqwest`.
//!
//! Auth endpoints authenticate with the server key (HTTP basic auth);
//! everything else presents the player's access token as a bearer
//! token. Non-success responses carry `{ "error": "..." }`, which is
//! surfaced as [`ApiError::Status`].

use gridlink_protocol::{AuthResponse, LeaderboardRecord};
use gridlink_session::{AuthApi, SessionError};
use serde::{Deserialize, Serialize};

use crate::{ApiError, Backend};

/// Configuration for [`HttpBackend`].
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL of the backend, e.g. `http://127.0.0.1:7350`.
    pub base_url: String,

    /// The key presented as basic auth on the two auth endpoints,
    /// identifying the client build rather than a player.
    pub server_key: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:7350".into(),
            server_key: "defaultkey".into(),
        }
    }
}

/// The production [`Backend`].
///
/// Cheap to clone: `reqwest::Client` is an `Arc` around a connection
/// pool.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    http: reqwest::Client,
    config: ApiConfig,
}

impl HttpBackend {
    /// Creates a backend client for the given configuration.
    ///
    /// No client-side timeout is set: callers that need a deadline wrap
    /// the operation in their own.
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self { http, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn device_auth_request(
        &self,
        device_id: &str,
        create: bool,
        username: &str,
    ) -> Result<AuthResponse, ApiError> {
        tracing::debug!(%username, "device auth");
        let response = self
            .http
            .post(self.url("/auth/device"))
            .basic_auth(&self.config.server_key, Some(""))
            .json(&DeviceAuthBody {
                id: device_id,
                create,
                username,
            })
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    async fn refresh_request(&self, refresh_token: &str) -> Result<AuthResponse, ApiError> {
        tracing::debug!("session refresh");
        let response = self
            .http
            .post(self.url("/auth/refresh"))
            .basic_auth(&self.config.server_key, Some(""))
            .json(&RefreshBody { refresh_token })
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }
}

impl AuthApi for HttpBackend {
    async fn authenticate_device(
        &self,
        device_id: &str,
        create: bool,
        username: &str,
    ) -> Result<AuthResponse, SessionError> {
        self.device_auth_request(device_id, create, username)
            .await
            .map_err(|e| SessionError::AuthFailed(e.to_string()))
    }

    async fn session_refresh(&self, refresh_token: &str) -> Result<AuthResponse, SessionError> {
        self.refresh_request(refresh_token)
            .await
            .map_err(|e| SessionError::AuthFailed(e.to_string()))
    }
}

impl Backend for HttpBackend {
    async fn list_leaderboard_records(
        &self,
        access_token: &str,
        leaderboard_id: &str,
        limit: u32,
    ) -> Result<Vec<LeaderboardRecord>, ApiError> {
        let response = self
            .http
            .get(self.url(&format!("/leaderboard/{leaderboard_id}")))
            .bearer_auth(access_token)
            .query(&[("limit", limit)])
            .send()
            .await?;
        let body: RecordsBody = check(response).await?.json().await?;
        Ok(body.records)
    }

    async fn list_leaderboard_records_around_owner(
        &self,
        access_token: &str,
        leaderboard_id: &str,
        owner_id: &str,
        limit: u32,
    ) -> Result<Vec<LeaderboardRecord>, ApiError> {
        let response = self
            .http
            .get(self.url(&format!("/leaderboard/{leaderboard_id}/around/{owner_id}")))
            .bearer_auth(access_token)
            .query(&[("limit", limit)])
            .send()
            .await?;
        let body: RecordsBody = check(response).await?.json().await?;
        Ok(body.records)
    }

    async fn rpc(
        &self,
        access_token: &str,
        id: &str,
        payload: serde_json::Value,
    ) -> Result<serde_json::Value, ApiError> {
        tracing::debug!(rpc = %id, "rpc call");
        let response = self
            .http
            .post(self.url(&format!("/rpc/{id}")))
            .bearer_auth(access_token)
            .json(&payload)
            .send()
            .await?;
        let body: RpcBody = check(response).await?.json().await?;
        Ok(body.payload)
    }
}

// ---------------------------------------------------------------------------
// Request/response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct DeviceAuthBody<'a> {
    id: &'a str,
    create: bool,
    username: &'a str,
}

#[derive(Debug, Serialize)]
struct RefreshBody<'a> {
    refresh_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct RecordsBody {
    #[serde(default)]
    records: Vec<LeaderboardRecord>,
}

#[derive(Debug, Deserialize)]
struct RpcBody {
    payload: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: String,
}

/// Passes success responses through; turns everything else into
/// [`ApiError::Status`], reading the backend's error body when there is
/// one.
async fn check(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = match response.json::<ErrorBody>().await {
        Ok(body) if !body.error.is_empty() => body.error,
        _ => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string(),
    };
    Err(ApiError::Status {
        code: status.as_u16(),
        message,
    })
}
