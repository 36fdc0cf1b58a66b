//! The unified error type.
//!
//! Each layer crate has its own error enum so that, inside a layer, an
//! error can only mean one kind of failure. At the client surface they
//! all funnel into [`GridlinkError`]: callers match on one type, and
//! `?` does the lifting via the `#[from]` conversions.

use gridlink_api::ApiError;
use gridlink_protocol::ProtocolError;
use gridlink_session::SessionError;
use gridlink_transport::TransportError;

/// Any error a [`GridlinkClient`](crate::GridlinkClient) operation can
/// return.
///
/// The first four variants are transparent wrappers: their `Display`
/// output is the wrapped error's, so log lines read the same whether an
/// error is inspected at the layer or at the surface. The remaining
/// variants are failures only the client layer can detect, because only
/// it knows whether a socket or a match is supposed to exist right now.
#[derive(Debug, thiserror::Error)]
pub enum GridlinkError {
    /// Session-layer failure: authentication, restore, refresh, expiry.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Transport-layer failure: dialing, sending, receiving.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Protocol-layer failure: a message that would not encode or decode.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// HTTP API failure: the request itself, or a non-2xx status.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The operation needs the realtime socket and it is not connected.
    #[error("not connected to the server")]
    NotConnected,

    /// The operation needs an active match and there is none.
    #[error("no active match")]
    NotInMatch,

    /// Joining a match failed; the reason is the server's or the wire's.
    #[error("failed to join match: {0}")]
    MatchJoin(String),

    /// Matchmaking failed: enqueue rejected, reply malformed, or the
    /// `create_match` RPC reported an error.
    #[error("matchmaking failed: {0}")]
    Matchmaking(String),
}

// =========================================================================
// Tests
// =========================================================================
