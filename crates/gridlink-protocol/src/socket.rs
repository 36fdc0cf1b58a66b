//! The realtime socket protocol.
//!
//! Everything that travels over the WebSocket is defined here. The protocol
//! has two directions and two delivery styles:
//!
//! - **Requests** (client → server) that expect a reply carry a client
//!   sequence id `cid`. The server echoes the `cid` on exactly one reply,
//!   which is how the client pairs replies with pending requests.
//! - **Fire-and-forget** requests (leaving a match, sending a move) omit
//!   the `cid`; no reply comes back.
//! - **Events** (server → client) arrive without a `cid` at any time:
//!   match-found notifications, match data, presence changes.
//!
//! ```text
//! client                                server
//!   │  {"cid":1, AddMatchmaker}  ────────▶ │
//!   │ ◀──────  {"cid":1, MatchmakerTicket} │
//!   │                                      │
//!   │ ◀──────  {MatchmakerMatched}         │   (no cid: event)
//!   │  {"cid":2, JoinMatch}  ────────────▶ │
//!   │ ◀──────  {"cid":2, MatchJoined}      │
//!   │  {MatchDataSend op=1}  ────────────▶ │   (no cid: fire and forget)
//!   │ ◀──────  {MatchData op=2}            │
//! ```
//!
//! Match payloads ride inside `MatchData` frames as raw JSON bytes plus an
//! op code; [`MatchMessage::decode`] turns them into typed values and
//! refuses anything it does not recognize.

use serde::{Deserialize, Serialize};

use std::fmt;

use crate::{
    ProtocolError, codec,
    types::{Board, MatchId, Player, Presence, Ticket},
};

/// Notification code announcing that a match was created for this client.
///
/// Sent when an opponent created a match directly and invited us, as
/// opposed to the matchmaker pairing two queued players (which arrives as
/// [`ServerMessage::MatchmakerMatched`]). Both signals mean the same thing
/// to the client: there is a match to join.
pub const NOTIFICATION_MATCH_FOUND: i64 = 1;

// ---------------------------------------------------------------------------
// Envelopes
// ---------------------------------------------------------------------------

/// Client → server frame.
///
/// `cid` is skipped during serialization when `None`, so fire-and-forget
/// frames are simply `{"request": {...}}` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cid: Option<u64>,
    pub request: ClientRequest,
}

/// Server → client frame. A present `cid` marks this as the reply to the
/// request sent with the same id; an absent `cid` marks an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cid: Option<u64>,
    pub message: ServerMessage,
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Everything the client can ask of the server over the socket.
///
/// `#[serde(tag = "type")]` produces internally tagged JSON:
/// `{"type": "JoinMatch", "match_id": "m-1"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientRequest {
    /// Enter the matchmaker pool. Gridlink always asks for a symmetric
    /// two-player pairing: `query "*"`, min 2, max 2.
    AddMatchmaker {
        query: String,
        min_count: u32,
        max_count: u32,
    },

    /// Leave the matchmaker pool. The ticket is the one handed out by the
    /// matching `AddMatchmaker` reply.
    RemoveMatchmaker { ticket: Ticket },

    /// Join a match by id (found via matchmaking or created directly).
    JoinMatch { match_id: MatchId },

    /// Leave the current match. Fire and forget.
    LeaveMatch { match_id: MatchId },

    /// Relay a game payload into the match. Fire and forget. `data` holds
    /// the JSON-encoded payload bytes for the given op code.
    MatchDataSend {
        match_id: MatchId,
        op_code: i64,
        data: Vec<u8>,
    },
}

// ---------------------------------------------------------------------------
// Server messages
// ---------------------------------------------------------------------------

/// Everything the server can send to the client, reply or event.
///
/// One enum covers both because both arrive on the same socket in the same
/// envelope shape — the `cid` on the envelope, not the message type, decides
/// how a frame is routed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Generic success reply for requests with no payload to return.
    Ack,

    /// Failure reply. `code` follows HTTP conventions.
    Error { code: u16, message: String },

    /// Reply to `AddMatchmaker`: the client is now queued under this ticket.
    MatchmakerTicket { ticket: Ticket },

    /// Reply to `JoinMatch`.
    MatchJoined {
        match_id: MatchId,
        #[serde(default)]
        presences: Vec<Presence>,
    },

    /// Out-of-band notification. Only [`NOTIFICATION_MATCH_FOUND`] carries
    /// meaning for this client; other codes are logged and ignored.
    Notification {
        code: i64,
        #[serde(default)]
        content: NotificationContent,
    },

    /// The matchmaker paired this client with an opponent.
    MatchmakerMatched {
        match_id: MatchId,
        /// The ticket this pairing resolves, when the server includes it.
        #[serde(default)]
        ticket: Option<Ticket>,
    },

    /// A game payload relayed from the match. `data` is decoded against
    /// `op_code` by [`MatchMessage::decode`].
    MatchData {
        match_id: MatchId,
        op_code: i64,
        data: Vec<u8>,
    },

    /// Players joined or left the match.
    MatchPresence {
        match_id: MatchId,
        #[serde(default)]
        joins: Vec<Presence>,
        #[serde(default)]
        leaves: Vec<Presence>,
    },
}

/// Payload of a [`ServerMessage::Notification`]. Fields beyond the match id
/// are ignored; a notification without one is dropped by the client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_id: Option<MatchId>,
}

// ---------------------------------------------------------------------------
// Op codes and match messages
// ---------------------------------------------------------------------------

/// The op codes a match-data frame can carry.
///
/// The numeric values are part of the wire contract — both sides agree that
/// 1 is a move, 2 a state update, 3 a game-over report, 4 an opponent
/// departure. Anything else fails decoding with
/// [`ProtocolError::UnknownOpCode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpCode {
    Move,
    Update,
    GameOver,
    OpponentLeft,
}

impl OpCode {
    /// The numeric wire value.
    pub fn code(self) -> i64 {
        match self {
            OpCode::Move => 1,
            OpCode::Update => 2,
            OpCode::GameOver => 3,
            OpCode::OpponentLeft => 4,
        }
    }
}

impl TryFrom<i64> for OpCode {
    type Error = ProtocolError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(OpCode::Move),
            2 => Ok(OpCode::Update),
            3 => Ok(OpCode::GameOver),
            4 => Ok(OpCode::OpponentLeft),
            other => Err(ProtocolError::UnknownOpCode(other)),
        }
    }
}

impl From<OpCode> for i64 {
    fn from(value: OpCode) -> Self {
        value.code()
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OpCode::Move => "move",
            OpCode::Update => "update",
            OpCode::GameOver => "game_over",
            OpCode::OpponentLeft => "opponent_left",
        };
        write!(f, "{name}")
    }
}

/// Payload for [`OpCode::Move`]: place our mark at `position` (0–8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovePayload {
    pub position: u8,
}

/// Payload for [`OpCode::Update`]: either the opening announcement or a
/// board refresh after a move.
///
/// `#[serde(rename_all = "snake_case")]` makes the tags `"game_start"` and
/// `"board_update"` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UpdatePayload {
    /// The match began: who plays which symbol, and whose turn it is
    /// (an index into `players`).
    GameStart {
        players: Vec<Player>,
        current_turn: usize,
    },

    /// A move was applied; here is the resulting board.
    BoardUpdate {
        board: Board,
        current_turn: usize,
    },
}

/// Payload for [`OpCode::GameOver`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOverPayload {
    pub board: Board,
    /// The winner's user id, or `None` for a draw.
    pub winner: Option<String>,
    /// Human-readable outcome ("X wins", "forfeit", …).
    pub reason: String,
}

/// A fully decoded match payload.
///
/// This is the tagged-union face of the op-code table: one variant per op
/// code, each carrying its typed payload. There is no "unknown" variant on
/// purpose — undecodable frames are errors, not values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchMessage {
    Move(MovePayload),
    Update(UpdatePayload),
    GameOver(GameOverPayload),
    OpponentLeft,
}

impl MatchMessage {
    /// Decodes the raw bytes of a match-data frame against its op code.
    ///
    /// Each op code has exactly one payload schema; bytes that do not match
    /// it are a [`ProtocolError::Decode`]. [`OpCode::OpponentLeft`] carries
    /// no payload and ignores the bytes entirely.
    pub fn decode(op_code: OpCode, data: &[u8]) -> Result<Self, ProtocolError> {
        match op_code {
            OpCode::Move => codec::decode::<MovePayload>(data).map(MatchMessage::Move),
            OpCode::Update => codec::decode::<UpdatePayload>(data).map(MatchMessage::Update),
            OpCode::GameOver => {
                codec::decode::<GameOverPayload>(data).map(MatchMessage::GameOver)
            }
            OpCode::OpponentLeft => Ok(MatchMessage::OpponentLeft),
        }
    }

    /// The op code this message travels under.
    pub fn op_code(&self) -> OpCode {
        match self {
            MatchMessage::Move(_) => OpCode::Move,
            MatchMessage::Update(_) => OpCode::Update,
            MatchMessage::GameOver(_) => OpCode::GameOver,
            MatchMessage::OpponentLeft => OpCode::OpponentLeft,
        }
    }
}

// ---------------------------------------------------------------------------
// Delivered events
// ---------------------------------------------------------------------------

/// What the match-data callback receives: the frame's origin, its op code,
/// and the decoded payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchDataEvent {
    pub match_id: MatchId,
    pub op_code: OpCode,
    pub message: MatchMessage,
}

/// What the presence callback receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchPresenceEvent {
    pub match_id: MatchId,
    pub joins: Vec<Presence>,
    pub leaves: Vec<Presence>,
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! The socket protocol has an exact JSON contract; these tests pin the
    //! shapes down so a serde attribute change cannot silently break the
    //! wire format.

    use super::*;
    use crate::types::Mark;

    fn empty_board() -> Board {
        Default::default()
    }

    // =====================================================================
    // Envelopes
    // =====================================================================

    #[test]
    fn test_client_envelope_with_cid_json_shape() {
        let env = ClientEnvelope {
            cid: Some(7),
            request: ClientRequest::JoinMatch {
                match_id: MatchId::from("m-1"),
            },
        };
        let json: serde_json::Value = serde_json::to_value(&env).unwrap();

        assert_eq!(json["cid"], 7);
        assert_eq!(json["request"]["type"], "JoinMatch");
        assert_eq!(json["request"]["match_id"], "m-1");
    }

    #[test]
    fn test_client_envelope_without_cid_omits_field() {
        // Fire-and-forget frames must not carry `"cid": null`.
        let env = ClientEnvelope {
            cid: None,
            request: ClientRequest::LeaveMatch {
                match_id: MatchId::from("m-1"),
            },
        };
        let json: serde_json::Value = serde_json::to_value(&env).unwrap();
        assert!(json.get("cid").is_none());
    }

    #[test]
    fn test_server_envelope_without_cid_is_event() {
        let json = r#"{"message": {"type": "Ack"}}"#;
        let env: ServerEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(env.cid, None);
        assert_eq!(env.message, ServerMessage::Ack);
    }

    // =====================================================================
    // ClientRequest
    // =====================================================================

    #[test]
    fn test_add_matchmaker_json_shape() {
        let req = ClientRequest::AddMatchmaker {
            query: "*".into(),
            min_count: 2,
            max_count: 2,
        };
        let json: serde_json::Value = serde_json::to_value(&req).unwrap();

        assert_eq!(json["type"], "AddMatchmaker");
        assert_eq!(json["query"], "*");
        assert_eq!(json["min_count"], 2);
        assert_eq!(json["max_count"], 2);
    }

    #[test]
    fn test_match_data_send_round_trip() {
        let req = ClientRequest::MatchDataSend {
            match_id: MatchId::from("m-1"),
            op_code: 1,
            data: br#"{"position":4}"#.to_vec(),
        };
        let bytes = serde_json::to_vec(&req).unwrap();
        let back: ClientRequest = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, req);
    }

    #[test]
    fn test_remove_matchmaker_round_trip() {
        let req = ClientRequest::RemoveMatchmaker {
            ticket: Ticket::from("t-9"),
        };
        let bytes = serde_json::to_vec(&req).unwrap();
        let back: ClientRequest = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, req);
    }

    // =====================================================================
    // ServerMessage
    // =====================================================================

    #[test]
    fn test_notification_with_match_id() {
        let json = r#"{
            "type": "Notification",
            "code": 1,
            "content": {"match_id": "m-55"}
        }"#;
        let msg: ServerMessage = serde_json::from_str(json).unwrap();
        assert_eq!(
            msg,
            ServerMessage::Notification {
                code: NOTIFICATION_MATCH_FOUND,
                content: NotificationContent {
                    match_id: Some(MatchId::from("m-55")),
                },
            }
        );
    }

    #[test]
    fn test_notification_content_defaults_when_missing() {
        // Some notification codes carry no content at all; the field
        // defaults to an empty payload instead of failing the whole frame.
        let json = r#"{"type": "Notification", "code": 3}"#;
        let msg: ServerMessage = serde_json::from_str(json).unwrap();
        let ServerMessage::Notification { code, content } = msg else {
            panic!("expected notification");
        };
        assert_eq!(code, 3);
        assert_eq!(content.match_id, None);
    }

    #[test]
    fn test_matchmaker_matched_without_ticket() {
        let json = r#"{"type": "MatchmakerMatched", "match_id": "m-2"}"#;
        let msg: ServerMessage = serde_json::from_str(json).unwrap();
        assert_eq!(
            msg,
            ServerMessage::MatchmakerMatched {
                match_id: MatchId::from("m-2"),
                ticket: None,
            }
        );
    }

    #[test]
    fn test_match_presence_lists_default_to_empty() {
        let json = r#"{"type": "MatchPresence", "match_id": "m-1"}"#;
        let msg: ServerMessage = serde_json::from_str(json).unwrap();
        assert_eq!(
            msg,
            ServerMessage::MatchPresence {
                match_id: MatchId::from("m-1"),
                joins: vec![],
                leaves: vec![],
            }
        );
    }

    #[test]
    fn test_unknown_message_type_fails_closed() {
        // No speculative parsing: an unrecognized tag is an error, not a
        // best-effort guess.
        let json = r#"{"type": "PartyInvite", "party_id": "p-1"}"#;
        let result: Result<ServerMessage, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    // =====================================================================
    // OpCode
    // =====================================================================

    #[test]
    fn test_op_code_wire_values() {
        assert_eq!(OpCode::Move.code(), 1);
        assert_eq!(OpCode::Update.code(), 2);
        assert_eq!(OpCode::GameOver.code(), 3);
        assert_eq!(OpCode::OpponentLeft.code(), 4);
    }

    #[test]
    fn test_op_code_try_from_round_trip() {
        for op in [
            OpCode::Move,
            OpCode::Update,
            OpCode::GameOver,
            OpCode::OpponentLeft,
        ] {
            assert_eq!(OpCode::try_from(op.code()).unwrap(), op);
        }
    }

    #[test]
    fn test_op_code_unknown_value_fails() {
        let err = OpCode::try_from(99).unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownOpCode(99)));
    }

    // =====================================================================
    // MatchMessage::decode
    // =====================================================================

    #[test]
    fn test_decode_move_payload() {
        let msg = MatchMessage::decode(OpCode::Move, br#"{"position": 4}"#).unwrap();
        assert_eq!(msg, MatchMessage::Move(MovePayload { position: 4 }));
        assert_eq!(msg.op_code(), OpCode::Move);
    }

    #[test]
    fn test_decode_game_start_update() {
        let data = br#"{
            "type": "game_start",
            "players": [
                {"user_id": "u-1", "username": "alice", "symbol": "X", "session_id": "s-1"},
                {"user_id": "u-2", "username": "bob", "symbol": "O", "session_id": "s-2"}
            ],
            "current_turn": 0
        }"#;
        let msg = MatchMessage::decode(OpCode::Update, data).unwrap();
        let MatchMessage::Update(UpdatePayload::GameStart { players, current_turn }) = msg
        else {
            panic!("expected game_start");
        };
        assert_eq!(players.len(), 2);
        assert_eq!(players[0].symbol, Mark::X);
        assert_eq!(current_turn, 0);
    }

    #[test]
    fn test_decode_board_update() {
        let data = br#"{
            "type": "board_update",
            "board": ["X",null,null,null,"O",null,null,null,null],
            "current_turn": 1
        }"#;
        let msg = MatchMessage::decode(OpCode::Update, data).unwrap();
        let MatchMessage::Update(UpdatePayload::BoardUpdate { board, .. }) = msg else {
            panic!("expected board_update");
        };
        assert_eq!(board[0], Some(Mark::X));
        assert_eq!(board[4], Some(Mark::O));
    }

    #[test]
    fn test_decode_game_over_with_winner() {
        let data = br#"{
            "board": ["X","X","X",null,"O","O",null,null,null],
            "winner": "u-1",
            "reason": "X wins"
        }"#;
        let msg = MatchMessage::decode(OpCode::GameOver, data).unwrap();
        let MatchMessage::GameOver(payload) = msg else {
            panic!("expected game_over");
        };
        assert_eq!(payload.winner.as_deref(), Some("u-1"));
        assert_eq!(payload.reason, "X wins");
    }

    #[test]
    fn test_decode_game_over_draw_has_no_winner() {
        let data = br#"{
            "board": ["X","O","X","X","O","O","O","X","X"],
            "winner": null,
            "reason": "draw"
        }"#;
        let msg = MatchMessage::decode(OpCode::GameOver, data).unwrap();
        let MatchMessage::GameOver(payload) = msg else {
            panic!("expected game_over");
        };
        assert_eq!(payload.winner, None);
    }

    #[test]
    fn test_decode_opponent_left_ignores_payload() {
        let msg = MatchMessage::decode(OpCode::OpponentLeft, b"{}").unwrap();
        assert_eq!(msg, MatchMessage::OpponentLeft);
        assert_eq!(msg.op_code(), OpCode::OpponentLeft);
    }

    #[test]
    fn test_decode_wrong_payload_for_op_code_fails() {
        // A move payload under the game-over op code must not "sort of"
        // parse — the schema is per op code.
        let result = MatchMessage::decode(OpCode::GameOver, br#"{"position": 4}"#);
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_decode_update_with_unknown_tag_fails() {
        let result =
            MatchMessage::decode(OpCode::Update, br#"{"type": "rollback", "to": 3}"#);
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_encode_move_then_decode_as_server_would() {
        let bytes = codec::encode(&MovePayload { position: 8 }).unwrap();
        let msg = MatchMessage::decode(OpCode::Move, &bytes).unwrap();
        assert_eq!(msg, MatchMessage::Move(MovePayload { position: 8 }));
    }
}
