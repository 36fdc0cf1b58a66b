//! Shapes exchanged with the HTTP API.
//!
//! The REST surface is small: two auth endpoints, leaderboard listings, and
//! an RPC escape hatch. The one piece of logic that lives here is the
//! leaderboard derivation — the server stores `score`/`subscore`, the UI
//! wants wins/losses/win-rate, and the mapping between them is part of the
//! contract.

use serde::{Deserialize, Serialize};

use crate::types::MatchId;

/// Shown when a leaderboard record arrives without a username.
pub const UNKNOWN_USERNAME: &str = "Unknown";

/// Reply from `POST /auth/device` and `POST /auth/refresh`.
///
/// `access_token` doubles as the session JWT; its claims mirror `user_id`,
/// `username`, and `expires_at` so a session can later be reconstructed
/// from storage without this response at hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user_id: String,
    pub username: String,
    /// Unix seconds at which the access token stops being accepted.
    pub expires_at: u64,
}

/// A raw leaderboard record as stored by the server.
///
/// `score` counts wins and `subscore` counts total games played; that
/// convention is what makes [`LeaderboardEntry`] derivable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardRecord {
    pub owner_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default)]
    pub score: u64,
    #[serde(default)]
    pub subscore: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<u64>,
}

/// A leaderboard row ready for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub username: String,
    pub wins: u64,
    pub losses: u64,
    /// Always zero: draws are not tracked on the leaderboard, only in the
    /// per-player stats.
    pub draws: u64,
    pub total_games: u64,
    /// Percentage of games won, rounded to two decimals. Zero when no
    /// games have been played.
    pub win_rate: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<u64>,
}

impl From<LeaderboardRecord> for LeaderboardEntry {
    fn from(record: LeaderboardRecord) -> Self {
        let wins = record.score;
        let total_games = record.subscore;
        // saturating: a record claiming more wins than games is a server
        // bug, but it must not take the client down with it.
        let losses = total_games.saturating_sub(wins);
        let win_rate = if total_games > 0 {
            round2(100.0 * wins as f64 / total_games as f64)
        } else {
            0.0
        };
        LeaderboardEntry {
            user_id: record.owner_id,
            username: record
                .username
                .unwrap_or_else(|| UNKNOWN_USERNAME.to_string()),
            wins,
            losses,
            draws: 0,
            total_games,
            win_rate,
            rank: record.rank,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Per-player stats returned by the `player_stats` RPC.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    #[serde(default)]
    pub wins: u64,
    #[serde(default)]
    pub losses: u64,
    #[serde(default)]
    pub draws: u64,
    #[serde(default)]
    pub total_games: u64,
}

/// Result payload of the `create_match` RPC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateMatchResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_id: Option<MatchId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn record(score: u64, subscore: u64) -> LeaderboardRecord {
        LeaderboardRecord {
            owner_id: "u-1".into(),
            username: Some("alice".into()),
            score,
            subscore,
            rank: Some(3),
        }
    }

    // =====================================================================
    // Leaderboard derivation
    // =====================================================================

    #[test]
    fn test_entry_derives_losses_and_win_rate() {
        let entry = LeaderboardEntry::from(record(7, 10));
        assert_eq!(entry.wins, 7);
        assert_eq!(entry.losses, 3);
        assert_eq!(entry.total_games, 10);
        assert_eq!(entry.win_rate, 70.0);
        assert_eq!(entry.draws, 0);
        assert_eq!(entry.rank, Some(3));
    }

    #[test]
    fn test_entry_win_rate_rounds_to_two_decimals() {
        // 1/3 → 33.333...% → 33.33
        let entry = LeaderboardEntry::from(record(1, 3));
        assert_eq!(entry.win_rate, 33.33);
        // 2/3 → 66.666...% → 66.67
        let entry = LeaderboardEntry::from(record(2, 3));
        assert_eq!(entry.win_rate, 66.67);
    }

    #[test]
    fn test_entry_with_no_games_has_zero_rate() {
        let entry = LeaderboardEntry::from(record(0, 0));
        assert_eq!(entry.wins, 0);
        assert_eq!(entry.losses, 0);
        assert_eq!(entry.win_rate, 0.0);
    }

    #[test]
    fn test_entry_with_more_wins_than_games_saturates() {
        // Inconsistent server data: losses clamp to zero instead of
        // underflowing.
        let entry = LeaderboardEntry::from(record(5, 3));
        assert_eq!(entry.losses, 0);
    }

    #[test]
    fn test_entry_missing_username_falls_back() {
        let entry = LeaderboardEntry::from(LeaderboardRecord {
            owner_id: "u-9".into(),
            username: None,
            score: 1,
            subscore: 2,
            rank: None,
        });
        assert_eq!(entry.username, UNKNOWN_USERNAME);
        assert_eq!(entry.rank, None);
    }

    // =====================================================================
    // DTO shapes
    // =====================================================================

    #[test]
    fn test_auth_response_round_trip() {
        let resp = AuthResponse {
            access_token: "at".into(),
            refresh_token: "rt".into(),
            user_id: "u-1".into(),
            username: "alice".into(),
            expires_at: 1_700_000_000,
        };
        let bytes = serde_json::to_vec(&resp).unwrap();
        let back: AuthResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, resp);
    }

    #[test]
    fn test_leaderboard_record_defaults_optional_fields() {
        let record: LeaderboardRecord =
            serde_json::from_str(r#"{"owner_id": "u-2"}"#).unwrap();
        assert_eq!(record.score, 0);
        assert_eq!(record.subscore, 0);
        assert_eq!(record.username, None);
        assert_eq!(record.rank, None);
    }

    #[test]
    fn test_player_stats_defaults_missing_counters() {
        let stats: PlayerStats = serde_json::from_str(r#"{"wins": 4}"#).unwrap();
        assert_eq!(stats.wins, 4);
        assert_eq!(stats.losses, 0);
        assert_eq!(stats.total_games, 0);
    }

    #[test]
    fn test_create_match_response_failure_shape() {
        let resp: CreateMatchResponse = serde_json::from_str(
            r#"{"success": false, "error": "too many open matches"}"#,
        )
        .unwrap();
        assert!(!resp.success);
        assert_eq!(resp.match_id, None);
        assert_eq!(resp.error.as_deref(), Some("too many open matches"));
    }
}
