//! The realtime connection supervisor.
//!
//! One socket serves the whole client: matchmaking, match traffic, and
//! notifications all share it. This module owns the three-state machine
//! that keeps it that way:
//!
//! ```text
//!            connect()                   dial ok
//! Disconnected ────────▶ Connecting ──────────────▶ Connected
//!      ▲                     │                          │
//!      │      dial failed    │                          │ disconnect() /
//!      └─────────────────────┘                          │ reader exit
//!      ▲                                                │
//!      └────────────────────────────────────────────────┘
//! ```
//!
//! - `connect()` while `Connecting` joins the waiter list instead of
//!   dialing again, so any number of concurrent callers produce exactly
//!   one dial and share its outcome.
//! - A connected socket is wrapped in a [`SocketLink`]: the correlation
//!   table pairing replies with requests by `cid`, plus the send side.
//! - A spawned reader task owns the receive side. It holds the client
//!   only weakly, so dropping the last [`GridlinkClient`] clone ends the
//!   reader instead of the reader keeping the client alive.
//!
//! [`GridlinkClient`]: crate::GridlinkClient

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex, Weak,
        atomic::{AtomicU64, Ordering},
    },
};

use tokio::sync::oneshot;

use gridlink_api::Backend;
use gridlink_protocol::{
    ClientEnvelope, ClientRequest, MatchPresenceEvent, NOTIFICATION_MATCH_FOUND, ServerEnvelope,
    ServerMessage, codec,
};
use gridlink_session::CredentialStore;
use gridlink_transport::{Connection, Connector, TransportError};

use crate::{
    GridlinkError,
    client::{ClientInner, lock},
};

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// Where the realtime socket currently stands. Guarded by the client's
/// async mutex; every transition happens under that lock.
pub(crate) enum SocketState<C> {
    /// No socket and no attempt in flight.
    Disconnected,

    /// One dial is in flight; `waiters` all get its outcome.
    Connecting {
        waiters: Vec<oneshot::Sender<Result<(), TransportError>>>,
    },

    /// A live socket with its reader task running.
    Connected { link: Arc<SocketLink<C>> },
}

/// A live connection plus the correlation table for request/reply
/// pairing.
///
/// Shared between the state machine (send side) and the reader task
/// (receive side). The table maps a `cid` to the oneshot that the
/// requesting task is awaiting; the reader completes entries as replies
/// arrive.
pub(crate) struct SocketLink<C> {
    conn: C,
    next_cid: AtomicU64,
    pending: Mutex<HashMap<u64, oneshot::Sender<ServerMessage>>>,
}

impl<C: Connection> SocketLink<C> {
    fn new(conn: C) -> Self {
        Self {
            conn,
            next_cid: AtomicU64::new(0),
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Sends a correlated request and waits for its reply.
    pub(crate) async fn request(
        &self,
        request: ClientRequest,
    ) -> Result<ServerMessage, GridlinkError> {
        let cid = self.next_cid.fetch_add(1, Ordering::Relaxed) + 1;
        let frame = codec::encode(&ClientEnvelope {
            cid: Some(cid),
            request,
        })?;

        let (tx, rx) = oneshot::channel();
        lock(&self.pending).insert(cid, tx);

        if let Err(e) = self.conn.send(&frame).await {
            lock(&self.pending).remove(&cid);
            return Err(e.into());
        }

        // A dropped sender means the reader failed the table: the link
        // died before the reply arrived.
        rx.await.map_err(|_| TransportError::Closed.into())
    }

    /// Sends a fire-and-forget request. No `cid`, no reply.
    pub(crate) async fn send(&self, request: ClientRequest) -> Result<(), GridlinkError> {
        let frame = codec::encode(&ClientEnvelope { cid: None, request })?;
        self.conn.send(&frame).await?;
        Ok(())
    }

    /// Routes a reply to the task waiting on its `cid`. Returns false
    /// when nothing waits under that id.
    fn complete(&self, cid: u64, message: ServerMessage) -> bool {
        match lock(&self.pending).remove(&cid) {
            Some(tx) => {
                // A send failure means the requester gave up waiting.
                let _ = tx.send(message);
                true
            }
            None => false,
        }
    }

    /// Drops every pending entry, waking each waiter with a closed
    /// channel.
    fn fail_pending(&self) {
        lock(&self.pending).clear();
    }

    async fn close(&self) {
        if let Err(e) = self.conn.close().await {
            tracing::debug!(error = %e, "socket close reported an error");
        }
    }
}

// ---------------------------------------------------------------------------
// Connect / disconnect
// ---------------------------------------------------------------------------

impl<B, C, S> ClientInner<B, C, S>
where
    B: Backend,
    C: Connector,
    S: CredentialStore,
{
    /// Brings the socket up, or joins the attempt already doing so.
    pub(crate) async fn connect(self: Arc<Self>) -> Result<(), GridlinkError> {
        // The socket URL carries the access token, so the session must
        // be valid before dialing.
        let token = {
            let mut sessions = self.sessions.lock().await;
            sessions
                .ensure_valid(&self.backend)
                .await?
                .access_token
                .clone()
        };

        let rx = {
            let mut socket = self.socket.lock().await;
            match &mut *socket {
                SocketState::Connected { .. } => return Ok(()),
                SocketState::Connecting { waiters } => {
                    let (tx, rx) = oneshot::channel();
                    waiters.push(tx);
                    rx
                }
                SocketState::Disconnected => {
                    let (tx, rx) = oneshot::channel();
                    *socket = SocketState::Connecting { waiters: vec![tx] };
                    // The attempt runs in its own task so that caller
                    // cancellation cannot strand the Connecting state.
                    let inner = Arc::clone(&self);
                    tokio::spawn(async move { inner.run_connect_attempt(token).await });
                    rx
                }
            }
        };

        match rx.await {
            Ok(outcome) => Ok(outcome?),
            // The attempt task always completes its waiters; a dropped
            // sender means the runtime tore it down mid-flight.
            Err(_) => Err(TransportError::Closed.into()),
        }
    }

    /// The single dial for one `Connecting` generation. Installs the
    /// link and the reader on success, then hands every waiter the
    /// shared outcome.
    async fn run_connect_attempt(self: Arc<Self>, token: String) {
        let url = format!("{}?token={}", self.config.socket_url, token);
        let dialed = self
            .connector
            .connect(&url)
            .await
            .map(|conn| Arc::new(SocketLink::new(conn)));

        let mut socket = self.socket.lock().await;
        let waiters = match std::mem::replace(&mut *socket, SocketState::Disconnected) {
            SocketState::Connecting { waiters } => waiters,
            // Nothing else transitions out of Connecting, so this arm
            // should never run; restore whatever was there.
            other => {
                *socket = other;
                return;
            }
        };

        match dialed {
            Ok(link) => {
                *socket = SocketState::Connected {
                    link: Arc::clone(&link),
                };
                drop(socket);

                tokio::spawn(run_reader(Arc::downgrade(&self), link));

                tracing::info!("socket connected");
                for tx in waiters {
                    let _ = tx.send(Ok(()));
                }
            }
            Err(e) => {
                drop(socket);
                tracing::warn!(error = %e, "socket connect failed");

                // One failure, many callers: each waiter gets its own
                // copy carrying the same message.
                let message = match &e {
                    TransportError::ConnectFailed(message) => message.clone(),
                    other => other.to_string(),
                };
                for tx in waiters {
                    let _ = tx.send(Err(TransportError::ConnectFailed(message.clone())));
                }
            }
        }
    }

    /// Closes the socket if one is up. Clears the active match handle;
    /// leaves session and matchmaking state alone. An in-flight connect
    /// attempt is not interrupted.
    pub(crate) async fn disconnect(&self) {
        let link = {
            let mut socket = self.socket.lock().await;
            match std::mem::replace(&mut *socket, SocketState::Disconnected) {
                SocketState::Connected { link } => Some(link),
                other => {
                    *socket = other;
                    None
                }
            }
        };

        if let Some(link) = link {
            link.close().await;
            link.fail_pending();
            self.clear_active_match();
            tracing::info!("disconnected");
        }
    }

    /// The current link, if connected.
    pub(crate) async fn current_link(&self) -> Option<Arc<SocketLink<C::Connection>>> {
        match &*self.socket.lock().await {
            SocketState::Connected { link } => Some(Arc::clone(link)),
            _ => None,
        }
    }

    pub(crate) async fn is_connected(&self) -> bool {
        self.current_link().await.is_some()
    }

    /// Called by the reader on its way out. Only resets the state when
    /// the dead link is still the installed one; a newer connection
    /// must not be torn down by an older reader.
    async fn reset_if_current(&self, link: &Arc<SocketLink<C::Connection>>) {
        let mut socket = self.socket.lock().await;
        if let SocketState::Connected { link: current } = &*socket {
            if Arc::ptr_eq(current, link) {
                *socket = SocketState::Disconnected;
                tracing::info!("connection lost");
            }
        }
    }

    // -----------------------------------------------------------------
    // Inbound dispatch
    // -----------------------------------------------------------------

    async fn dispatch_frame(&self, link: &Arc<SocketLink<C::Connection>>, frame: &[u8]) {
        let envelope: ServerEnvelope = match codec::decode(frame) {
            Ok(envelope) => envelope,
            Err(e) => {
                // Malformed input never changes client state.
                tracing::warn!(error = %e, "dropping undecodable frame");
                return;
            }
        };

        match envelope.cid {
            Some(cid) => {
                if !link.complete(cid, envelope.message) {
                    tracing::debug!(cid, "reply for a request no longer waiting");
                }
            }
            None => self.dispatch_event(envelope.message).await,
        }
    }

    async fn dispatch_event(&self, message: ServerMessage) {
        match message {
            ServerMessage::Notification { code, content } => {
                if code != NOTIFICATION_MATCH_FOUND {
                    tracing::debug!(code, "ignoring notification");
                    return;
                }
                match content.match_id {
                    Some(match_id) => self.handle_match_found(match_id).await,
                    None => tracing::warn!("match notification without a match id"),
                }
            }
            ServerMessage::MatchmakerMatched { match_id, .. } => {
                self.handle_match_found(match_id).await;
            }
            ServerMessage::MatchData {
                match_id,
                op_code,
                data,
            } => {
                self.handle_match_data(match_id, op_code, &data);
            }
            ServerMessage::MatchPresence {
                match_id,
                joins,
                leaves,
            } => {
                self.callbacks.notify_match_presence(MatchPresenceEvent {
                    match_id,
                    joins,
                    leaves,
                });
            }
            ServerMessage::Error { code, message } => {
                tracing::warn!(code, %message, "server reported an error");
            }
            other => {
                // Reply-shaped messages without a cid have no waiter to
                // route to.
                tracing::debug!(?other, "ignoring uncorrelated reply message");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Reader task
// ---------------------------------------------------------------------------

/// Receive loop for one connection generation.
///
/// Exits on remote close, receive error, or when the client itself has
/// been dropped. On the way out it fails the correlation table so no
/// requester waits forever.
async fn run_reader<B, C, S>(
    client: Weak<ClientInner<B, C, S>>,
    link: Arc<SocketLink<C::Connection>>,
) where
    B: Backend,
    C: Connector,
    S: CredentialStore,
{
    loop {
        match link.conn.recv().await {
            Ok(Some(frame)) => {
                let Some(inner) = client.upgrade() else { break };
                inner.dispatch_frame(&link, &frame).await;
            }
            Ok(None) => {
                tracing::info!("server closed the socket");
                break;
            }
            Err(e) => {
                tracing::warn!(error = %e, "socket receive failed");
                break;
            }
        }
    }

    link.fail_pending();
    if let Some(inner) = client.upgrade() {
        inner.reset_if_current(&link).await;
    }
}
