//! Core protocol types shared by the socket and REST surfaces.
//!
//! These are the nouns of the system: who is playing, which match they are
//! in, and what the 3x3 board looks like. Everything here is serializable
//! because all of it appears inside wire messages at some point.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// An opaque match identifier assigned by the server.
///
/// A newtype wrapper around `String`: the server hands out match ids and the
/// client only ever passes them back, so nothing should be able to confuse a
/// match id with a matchmaking ticket even though both are strings on the
/// wire. `#[serde(transparent)]` keeps the JSON representation a plain
/// string — `MatchId("m-1")` serializes as `"m-1"`, not `{"0": "m-1"}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(pub String);

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for MatchId {
    fn from(value: &str) -> Self {
        MatchId(value.to_string())
    }
}

/// An opaque matchmaking ticket assigned by the server on enqueue.
///
/// Held while the client waits in the matchmaker pool; needed again to
/// cancel. Same newtype treatment as [`MatchId`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ticket(pub String);

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Ticket {
    fn from(value: &str) -> Self {
        Ticket(value.to_string())
    }
}

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// A player's symbol on the board.
///
/// Serializes as `"X"` / `"O"` — the variant names are already the wire
/// strings, so no rename attribute is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    X,
    O,
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mark::X => write!(f, "X"),
            Mark::O => write!(f, "O"),
        }
    }
}

/// The 3x3 board in row-major order: position 0 is the top-left cell,
/// position 8 the bottom-right. `None` means the cell is empty.
///
/// On the wire this is a 9-element JSON array of `"X"`, `"O"`, or `null`.
pub type Board = [Option<Mark>; 9];

// ---------------------------------------------------------------------------
// People
// ---------------------------------------------------------------------------

/// A participant in a match, as announced in the game-start payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub user_id: String,
    pub username: String,
    /// Which symbol this player places. The match creator plays [`Mark::X`].
    pub symbol: Mark,
    pub session_id: String,
}

/// A user present in (or leaving) a match, as reported by presence events
/// and join replies. Unlike [`Player`] this carries no symbol — presence is
/// about who is connected, not about game roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Presence {
    pub user_id: String,
    pub username: String,
    pub session_id: String,
}

/// The descriptor returned by a successful match join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchInfo {
    pub match_id: MatchId,
    /// Who was already in the match at join time.
    pub presences: Vec<Presence>,
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // =====================================================================
    // Identity types
    // =====================================================================

    #[test]
    fn test_match_id_serializes_as_plain_string() {
        // `#[serde(transparent)]` means MatchId("m-1") → "m-1".
        let json = serde_json::to_string(&MatchId::from("m-1")).unwrap();
        assert_eq!(json, "\"m-1\"");
    }

    #[test]
    fn test_match_id_deserializes_from_plain_string() {
        let id: MatchId = serde_json::from_str("\"m-1\"").unwrap();
        assert_eq!(id, MatchId::from("m-1"));
    }

    #[test]
    fn test_ticket_display_is_inner_string() {
        assert_eq!(Ticket::from("t-42").to_string(), "t-42");
    }

    // =====================================================================
    // Mark and Board
    // =====================================================================

    #[test]
    fn test_mark_serializes_as_letter() {
        assert_eq!(serde_json::to_string(&Mark::X).unwrap(), "\"X\"");
        assert_eq!(serde_json::to_string(&Mark::O).unwrap(), "\"O\"");
    }

    #[test]
    fn test_board_round_trip() {
        let mut board: Board = Default::default();
        board[0] = Some(Mark::X);
        board[4] = Some(Mark::O);
        let json = serde_json::to_string(&board).unwrap();
        assert_eq!(json, r#"["X",null,null,null,"O",null,null,null,null]"#);

        let back: Board = serde_json::from_str(&json).unwrap();
        assert_eq!(back, board);
    }

    #[test]
    fn test_board_rejects_wrong_length() {
        // Eight cells is not a board. Strict decoding refuses it.
        let result: Result<Board, _> =
            serde_json::from_str(r#"[null,null,null,null,null,null,null,null]"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_board_rejects_unknown_symbol() {
        let result: Result<Board, _> = serde_json::from_str(
            r#"["Z",null,null,null,null,null,null,null,null]"#,
        );
        assert!(result.is_err());
    }

    // =====================================================================
    // Player / Presence
    // =====================================================================

    #[test]
    fn test_player_round_trip() {
        let player = Player {
            user_id: "u-1".into(),
            username: "alice".into(),
            symbol: Mark::X,
            session_id: "s-1".into(),
        };
        let bytes = serde_json::to_vec(&player).unwrap();
        let back: Player = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, player);
    }

    #[test]
    fn test_player_symbol_json_shape() {
        let player = Player {
            user_id: "u-1".into(),
            username: "alice".into(),
            symbol: Mark::O,
            session_id: "s-1".into(),
        };
        let json: serde_json::Value = serde_json::to_value(&player).unwrap();
        assert_eq!(json["symbol"], "O");
        assert_eq!(json["user_id"], "u-1");
    }
}
