//! # Gridlink
//!
//! Client-side core for a realtime, turn-based grid game. Gridlink owns
//! the four long-lived pieces a game UI needs and keeps them consistent
//! while any number of tasks use them:
//!
//! - **Session** — device auth, token persistence across runs, refresh
//!   before expiry
//! - **Connection** — one realtime socket shared by everything, with
//!   request/reply correlation
//! - **Matchmaking** — one ticket at a time, one match-found signal no
//!   matter how many channels announce it
//! - **Match** — join, send moves, receive the opponent's
//!
//! The UI above supplies callbacks and renders; the server below runs
//! the game rules. This crate is the state machine between them.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use gridlink::prelude::*;
//!
//! # async fn run() -> Result<(), GridlinkError> {
//! let client = GridlinkClient::builder()
//!     .base_url("http://127.0.0.1:7350")
//!     .socket_url("ws://127.0.0.1:7350/ws")
//!     .build()?;
//!
//! client.authenticate("alice").await?;
//! client.connect().await?;
//!
//! let for_join = client.clone();
//! client.on_match_found(move |match_id| {
//!     let client = for_join.clone();
//!     tokio::spawn(async move {
//!         let info = client.join_match(&match_id).await;
//!         println!("joined: {info:?}");
//!     });
//! });
//!
//! let ticket = client.find_match().await?;
//! println!("queued as {ticket}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Crate layout
//!
//! ```text
//! gridlink            this crate: client state machine + facade
//! ├── gridlink-api        HTTP backend (auth, leaderboard, RPC)
//! ├── gridlink-session    session lifecycle + credential storage
//! ├── gridlink-transport  bytes over WebSocket, swappable for tests
//! └── gridlink-protocol   wire types and codec, shared by all of them
//! ```

mod callbacks;
mod client;
mod config;
mod error;
mod matches;
mod matchmaking;
mod socket;

pub use client::{DefaultClient, GridlinkClient, GridlinkClientBuilder};
pub use config::ClientConfig;
pub use error::GridlinkError;

// The layer crates, re-exported so depending on `gridlink` alone is
// enough.
pub use gridlink_api as api;
pub use gridlink_protocol as protocol;
pub use gridlink_session as session;
pub use gridlink_transport as transport;

/// The usual imports, one `use` away.
pub mod prelude {
    pub use crate::{
        ClientConfig, DefaultClient, GridlinkClient, GridlinkClientBuilder, GridlinkError,
    };
    pub use gridlink_api::{ApiConfig, ApiError, Backend, HttpBackend};
    pub use gridlink_protocol::{
        Board, GameOverPayload, LeaderboardEntry, Mark, MatchDataEvent, MatchId, MatchInfo,
        MatchMessage, MatchPresenceEvent, MovePayload, OpCode, PlayerStats, ProtocolError, Ticket,
        UpdatePayload,
    };
    pub use gridlink_session::{
        AuthApi, CredentialStore, FileCredentialStore, MemoryCredentialStore, Session,
        SessionError, SessionManager,
    };
    pub use gridlink_transport::{Connection, Connector, TransportError, WebSocketConnector};
}
