//! The client facade and its shared inner state.
//!
//! [`GridlinkClient`] is a cheap-to-clone handle: every clone shares one
//! [`ClientInner`] behind an `Arc`, which is what lets a UI task, a
//! background task, and the reader task all talk to the same session,
//! socket, and matchmaking state.
//!
//! # Locking
//!
//! Three async mutexes and two sync ones, with fixed roles:
//!
//! - `sessions` (async) is held across refresh I/O. That is deliberate:
//!   concurrent `ensure_valid` callers serialize here, so an expiring
//!   token triggers at most one refresh request.
//! - `socket` and `matchmaking` (async) guard their state machines;
//!   slow work (dialing, enqueueing) happens in spawned tasks, not
//!   under the lock.
//! - The active match handle and the callback slots use `std` mutexes,
//!   never held across an await.

use std::{
    path::PathBuf,
    sync::{Arc, Mutex as StdMutex, MutexGuard},
};

use tokio::sync::Mutex;

use gridlink_api::{ApiConfig, Backend, HttpBackend, rpc_id};
use gridlink_protocol::{
    CreateMatchResponse, LeaderboardEntry, MatchDataEvent, MatchId, MatchInfo,
    MatchPresenceEvent, PlayerStats, ProtocolError, Ticket,
};
use gridlink_session::{CredentialStore, FileCredentialStore, Session, SessionManager};
use gridlink_transport::{Connector, WebSocketConnector};

use crate::{
    GridlinkError, callbacks::Callbacks, config::ClientConfig, matchmaking::MatchmakingState,
    socket::SocketState,
};

/// Locks a std mutex, recovering the data from a poisoned lock.
///
/// Callback panics poison the slots they were cloned from; the state
/// under these locks is a plain value that stays coherent regardless,
/// so the client keeps working instead of poisoning every later call.
pub(crate) fn lock<T>(mutex: &StdMutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// The client built by [`GridlinkClientBuilder`]: real HTTP backend,
/// real WebSocket connector, credentials on disk.
pub type DefaultClient = GridlinkClient<HttpBackend, WebSocketConnector, FileCredentialStore>;

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Everything the client owns, shared by all clones and by the spawned
/// connect, enqueue, and reader tasks.
pub(crate) struct ClientInner<B, C, S>
where
    B: Backend,
    C: Connector,
    S: CredentialStore,
{
    pub(crate) config: ClientConfig,
    pub(crate) backend: B,
    pub(crate) connector: C,
    pub(crate) sessions: Mutex<SessionManager<S>>,
    pub(crate) socket: Mutex<SocketState<C::Connection>>,
    pub(crate) matchmaking: Mutex<MatchmakingState>,
    pub(crate) active_match: StdMutex<Option<MatchId>>,
    pub(crate) callbacks: Callbacks,
}

impl<B, C, S> ClientInner<B, C, S>
where
    B: Backend,
    C: Connector,
    S: CredentialStore,
{
    /// A session valid for at least the next backend call. The manager
    /// lock is held across any refresh this triggers.
    pub(crate) async fn ensure_valid_session(&self) -> Result<Session, GridlinkError> {
        let mut sessions = self.sessions.lock().await;
        Ok(sessions.ensure_valid(&self.backend).await?.clone())
    }
}

// ---------------------------------------------------------------------------
// Client facade
// ---------------------------------------------------------------------------

/// A connected, authenticated view of the game service.
///
/// One value owns the whole client side of a player: the session and
/// its stored tokens, the realtime socket, the matchmaking ticket, and
/// the active match. Clones share that state, so handing a clone to a
/// spawned task is the expected way to use it:
///
/// ```rust,no_run
/// # async fn run(client: gridlink::DefaultClient) {
/// let for_task = client.clone();
/// tokio::spawn(async move {
///     let _ = for_task.find_match().await;
/// });
/// # }
/// ```
///
/// # Why three type parameters?
///
/// The backend, the connector, and the credential store are the three
/// places the client touches the outside world. Each sits behind a
/// trait so tests can swap in an in-process fake; production code uses
/// [`GridlinkClient::builder`] and never spells the parameters out.
pub struct GridlinkClient<B, C, S>
where
    B: Backend,
    C: Connector,
    S: CredentialStore,
{
    inner: Arc<ClientInner<B, C, S>>,
}

impl<B, C, S> Clone for GridlinkClient<B, C, S>
where
    B: Backend,
    C: Connector,
    S: CredentialStore,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B, C, S> GridlinkClient<B, C, S>
where
    B: Backend,
    C: Connector,
    S: CredentialStore,
{
    /// Creates a client from its parts and restores any session the
    /// previous run persisted.
    pub fn new(backend: B, connector: C, store: S, config: ClientConfig) -> Self {
        let mut sessions = SessionManager::new(store);
        sessions.restore();

        Self {
            inner: Arc::new(ClientInner {
                config,
                backend,
                connector,
                sessions: Mutex::new(sessions),
                socket: Mutex::new(SocketState::Disconnected),
                matchmaking: Mutex::new(MatchmakingState::default()),
                active_match: StdMutex::new(None),
                callbacks: Callbacks::new(),
            }),
        }
    }

    // -----------------------------------------------------------------
    // Session
    // -----------------------------------------------------------------

    /// Signs in as `username`, creating the account on first use.
    pub async fn authenticate(&self, username: &str) -> Result<Session, GridlinkError> {
        let mut sessions = self.inner.sessions.lock().await;
        Ok(sessions.authenticate(&self.inner.backend, username).await?.clone())
    }

    /// The current session, if any. No validity check; see
    /// [`is_authenticated`](Self::is_authenticated).
    pub async fn session(&self) -> Option<Session> {
        self.inner.sessions.lock().await.current().cloned()
    }

    /// True when a session exists and its token has not expired.
    pub async fn is_authenticated(&self) -> bool {
        self.inner.sessions.lock().await.is_authenticated()
    }

    /// Forces a token refresh now.
    pub async fn refresh_session(&self) -> Result<Session, GridlinkError> {
        let mut sessions = self.inner.sessions.lock().await;
        Ok(sessions.refresh(&self.inner.backend).await?.clone())
    }

    /// A session valid for at least the next backend call, refreshing
    /// first if the current one expires soon.
    pub async fn ensure_valid_session(&self) -> Result<Session, GridlinkError> {
        self.inner.ensure_valid_session().await
    }

    // -----------------------------------------------------------------
    // Connection
    // -----------------------------------------------------------------

    /// Brings the realtime socket up. Concurrent callers share one dial
    /// and its outcome; calling while connected is a no-op.
    pub async fn connect(&self) -> Result<(), GridlinkError> {
        Arc::clone(&self.inner).connect().await
    }

    /// Closes the socket and clears the active match handle. Session
    /// and matchmaking ticket are untouched.
    pub async fn disconnect(&self) {
        self.inner.disconnect().await;
    }

    pub async fn is_connected(&self) -> bool {
        self.inner.is_connected().await
    }

    // -----------------------------------------------------------------
    // Matchmaking
    // -----------------------------------------------------------------

    /// Queues for a two-player match and returns the ticket. With a
    /// ticket already active, returns it instead of queueing again.
    pub async fn find_match(&self) -> Result<Ticket, GridlinkError> {
        Arc::clone(&self.inner).find_match().await
    }

    /// Leaves the matchmaker pool. Without a ticket this logs a warning
    /// and succeeds.
    pub async fn cancel_matchmaking(&self) -> Result<(), GridlinkError> {
        self.inner.cancel_matchmaking().await
    }

    pub async fn current_ticket(&self) -> Option<Ticket> {
        self.inner.current_ticket().await
    }

    pub async fn is_matchmaking(&self) -> bool {
        self.inner.current_ticket().await.is_some()
    }

    /// Registers the match-found handler. One slot: registering again
    /// replaces the previous handler.
    ///
    /// The handler runs on the reader task. Joining the match from
    /// inside it means spawning, as in the crate example.
    pub fn on_match_found(&self, handler: impl Fn(MatchId) + Send + Sync + 'static) {
        self.inner.callbacks.set_match_found(handler);
    }

    // -----------------------------------------------------------------
    // Match
    // -----------------------------------------------------------------

    /// Joins the given match and returns who is already there.
    pub async fn join_match(&self, match_id: &MatchId) -> Result<MatchInfo, GridlinkError> {
        Arc::clone(&self.inner).join_match(match_id).await
    }

    /// Sends our move at `position` (0 through 8). Fire and forget: a
    /// confirmed board state follows as a match-data event.
    pub async fn send_move(&self, position: u8) -> Result<(), GridlinkError> {
        self.inner.send_move(position).await
    }

    /// Leaves the current match. Without one this logs a warning and
    /// succeeds.
    pub async fn leave_match(&self) -> Result<(), GridlinkError> {
        self.inner.leave_match().await
    }

    pub fn current_match_id(&self) -> Option<MatchId> {
        self.inner.current_match_id()
    }

    pub fn is_in_match(&self) -> bool {
        self.inner.current_match_id().is_some()
    }

    /// Registers the match-data handler (moves, board updates, game
    /// over, opponent left). One slot, last registration wins.
    pub fn on_match_data(&self, handler: impl Fn(MatchDataEvent) + Send + Sync + 'static) {
        self.inner.callbacks.set_match_data(handler);
    }

    /// Registers the presence handler (players joining and leaving the
    /// match). One slot, last registration wins.
    pub fn on_match_presence(&self, handler: impl Fn(MatchPresenceEvent) + Send + Sync + 'static) {
        self.inner.callbacks.set_match_presence(handler);
    }

    // -----------------------------------------------------------------
    // Backend queries
    // -----------------------------------------------------------------

    /// Top `limit` rows of the configured leaderboard.
    pub async fn leaderboard(&self, limit: u32) -> Result<Vec<LeaderboardEntry>, GridlinkError> {
        let session = self.inner.ensure_valid_session().await?;
        let records = self
            .inner
            .backend
            .list_leaderboard_records(
                &session.access_token,
                &self.inner.config.leaderboard_id,
                limit,
            )
            .await?;
        Ok(records.into_iter().map(LeaderboardEntry::from).collect())
    }

    /// Leaderboard rows centered on the current player.
    pub async fn leaderboard_around_self(
        &self,
        limit: u32,
    ) -> Result<Vec<LeaderboardEntry>, GridlinkError> {
        let session = self.inner.ensure_valid_session().await?;
        let records = self
            .inner
            .backend
            .list_leaderboard_records_around_owner(
                &session.access_token,
                &self.inner.config.leaderboard_id,
                &session.user_id,
                limit,
            )
            .await?;
        Ok(records.into_iter().map(LeaderboardEntry::from).collect())
    }

    /// The current player's win/loss/draw record.
    pub async fn player_stats(&self) -> Result<PlayerStats, GridlinkError> {
        let session = self.inner.ensure_valid_session().await?;
        let payload = self
            .inner
            .backend
            .rpc(
                &session.access_token,
                rpc_id::PLAYER_STATS,
                serde_json::json!({}),
            )
            .await?;
        serde_json::from_value(payload)
            .map_err(|e| GridlinkError::Protocol(ProtocolError::Decode(e)))
    }

    /// Waits out the configured delay, then fetches stats. For the
    /// post-game screen: the backend finalizes results asynchronously,
    /// so an immediate fetch would often still show the old numbers.
    pub async fn refresh_stats_after_game(&self) -> Result<PlayerStats, GridlinkError> {
        tokio::time::sleep(self.inner.config.stats_refresh_delay).await;
        self.player_stats().await
    }

    /// Creates a match directly (bypassing the matchmaker) and returns
    /// its id, ready to share with an opponent.
    pub async fn create_match(&self) -> Result<MatchId, GridlinkError> {
        let session = self.inner.ensure_valid_session().await?;
        let payload = self
            .inner
            .backend
            .rpc(
                &session.access_token,
                rpc_id::CREATE_MATCH,
                serde_json::json!({}),
            )
            .await?;

        let response: CreateMatchResponse = serde_json::from_value(payload)
            .map_err(|e| GridlinkError::Protocol(ProtocolError::Decode(e)))?;
        if !response.success {
            return Err(GridlinkError::Matchmaking(
                response
                    .error
                    .unwrap_or_else(|| "match creation failed".to_string()),
            ));
        }
        response.match_id.ok_or_else(|| {
            GridlinkError::Protocol(ProtocolError::Malformed(
                "create_match result carried no match id".to_string(),
            ))
        })
    }

    // -----------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------

    /// Signs out: best-effort matchmaking cancel, disconnect, then the
    /// session, stored credentials, callbacks, and ticket are cleared.
    /// Never fails; remote teardown problems are logged and skipped.
    pub async fn logout(&self) {
        if let Err(e) = self.inner.cancel_matchmaking().await {
            tracing::debug!(error = %e, "matchmaking cancel during logout failed");
        }
        self.inner.disconnect().await;
        self.inner.sessions.lock().await.logout();
        self.inner.callbacks.clear();
        self.inner.reset_matchmaking().await;
    }
}

impl DefaultClient {
    /// A builder for the production configuration. Defined on the
    /// concrete client type so `GridlinkClient::builder()` needs no
    /// type annotations.
    pub fn builder() -> GridlinkClientBuilder {
        GridlinkClientBuilder::new()
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builds the production [`DefaultClient`].
///
/// Every setting has a default aimed at a local development server;
/// override what differs and call [`build`](Self::build).
#[derive(Debug, Default)]
pub struct GridlinkClientBuilder {
    config: ClientConfig,
    credentials_dir: Option<PathBuf>,
}

impl GridlinkClientBuilder {
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
            credentials_dir: None,
        }
    }

    /// Base URL for the HTTP API.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// URL the realtime socket dials.
    pub fn socket_url(mut self, url: impl Into<String>) -> Self {
        self.config.socket_url = url.into();
        self
    }

    /// Key presented to the auth endpoints.
    pub fn server_key(mut self, key: impl Into<String>) -> Self {
        self.config.server_key = key.into();
        self
    }

    /// Leaderboard backing the win tables.
    pub fn leaderboard_id(mut self, id: impl Into<String>) -> Self {
        self.config.leaderboard_id = id.into();
        self
    }

    /// Delay before the post-game stats fetch.
    pub fn stats_refresh_delay(mut self, delay: std::time::Duration) -> Self {
        self.config.stats_refresh_delay = delay;
        self
    }

    /// Directory for stored credentials. Defaults to a `gridlink`
    /// folder under the platform's local data directory.
    pub fn credentials_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.credentials_dir = Some(dir.into());
        self
    }

    /// Builds the client and restores any persisted session.
    pub fn build(self) -> Result<DefaultClient, GridlinkError> {
        let backend = HttpBackend::new(ApiConfig {
            base_url: self.config.base_url.clone(),
            server_key: self.config.server_key.clone(),
        })?;
        let dir = self.credentials_dir.unwrap_or_else(default_credentials_dir);
        let store = FileCredentialStore::new(dir);

        Ok(GridlinkClient::new(
            backend,
            WebSocketConnector::new(),
            store,
            self.config,
        ))
    }
}

fn default_credentials_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("gridlink")
}

// =========================================================================
// Tests
// =========================================================================
