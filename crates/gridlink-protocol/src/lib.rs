//! Wire protocol for Gridlink.
//!
//! This crate defines everything that crosses a process boundary when the
//! client talks to the game service:
//!
//! - **Core types** ([`MatchId`], [`Ticket`], [`Mark`], [`Player`], …) —
//!   the vocabulary shared by the socket and REST surfaces.
//! - **Socket messages** ([`ClientEnvelope`], [`ServerEnvelope`],
//!   [`MatchMessage`], [`OpCode`]) — the realtime protocol, including the
//!   op-coded match payloads.
//! - **REST DTOs** ([`AuthResponse`], [`LeaderboardRecord`],
//!   [`PlayerStats`], …) — shapes exchanged with the HTTP API, plus the
//!   win/loss derivation that turns raw records into [`LeaderboardEntry`]s.
//! - **Codec helpers** ([`codec::encode`], [`codec::decode`]) — JSON
//!   conversion with uniform [`ProtocolError`] reporting.
//!
//! # Architecture
//!
//! The protocol layer knows nothing about connections, sessions, or
//! matchmaking state. It only defines shapes and how to (de)serialize them.
//! Decoding is strict: a frame either parses into a known variant or it is
//! rejected — there is no field probing across candidate shapes.
//!
//! ```text
//! Transport (bytes) → Protocol (typed messages) → Client (state + callbacks)
//! ```

pub mod codec;

mod api;
mod error;
mod socket;
mod types;

pub use api::{
    AuthResponse, CreateMatchResponse, LeaderboardEntry, LeaderboardRecord,
    PlayerStats, UNKNOWN_USERNAME,
};
pub use error::ProtocolError;
pub use socket::{
    ClientEnvelope, ClientRequest, GameOverPayload, MatchDataEvent,
    MatchMessage, MatchPresenceEvent, MovePayload, NotificationContent,
    OpCode, ServerEnvelope, ServerMessage, UpdatePayload,
    NOTIFICATION_MATCH_FOUND,
};
pub use types::{Board, Mark, MatchId, MatchInfo, Player, Presence, Ticket};
