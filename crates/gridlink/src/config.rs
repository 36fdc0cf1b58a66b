//! Client configuration.

use std::time::Duration;

/// Configuration for a [`GridlinkClient`](crate::GridlinkClient).
///
/// The defaults point at a local development server. Production callers
/// go through [`GridlinkClientBuilder`](crate::GridlinkClientBuilder)
/// rather than filling this in by hand.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL for the HTTP API.
    pub base_url: String,

    /// URL the realtime socket dials. The access token is appended as a
    /// `token` query parameter at connect time.
    pub socket_url: String,

    /// Key presented to the auth endpoints, identifying the client
    /// build rather than a player.
    pub server_key: String,

    /// Leaderboard that backs the win tables.
    pub leaderboard_id: String,

    /// How long to wait after a game before refetching stats. The
    /// backend finalizes results asynchronously, so an immediate fetch
    /// would often see the pre-game numbers.
    pub stats_refresh_delay: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:7350".to_string(),
            socket_url: "ws://127.0.0.1:7350/ws".to_string(),
            server_key: "defaultkey".to_string(),
            leaderboard_id: "tictactoe_wins".to_string(),
            stats_refresh_delay: Duration::from_secs(1),
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
