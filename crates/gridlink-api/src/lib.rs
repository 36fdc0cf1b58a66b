//! HTTP backend client for Gridlink.
//!
//! Everything the client asks the backend over plain HTTP lives here:
//! device authentication, session refresh, leaderboard queries, and
//! server RPCs. The realtime socket is a separate concern
//! (`gridlink-transport`).
//!
//! The [`Backend`] trait is the seam the client layer programs
//! against: [`HttpBackend`] implements it with `reqwest`, and tests
//! implement it with canned data. `Backend` extends
//! [`AuthApi`](gridlink_session::AuthApi), so one value serves both the
//! session layer and the query layer.

mod error;
mod http;

pub use error::ApiError;
pub use http::{ApiConfig, HttpBackend};

use gridlink_protocol::LeaderboardRecord;
use gridlink_session::AuthApi;

/// Well-known RPC ids the client calls.
pub mod rpc_id {
    /// Creates a fresh match on the game server and returns its id.
    pub const CREATE_MATCH: &str = "create_match";
    /// Returns the calling player's win/loss/draw record.
    pub const PLAYER_STATS: &str = "player_stats";
}

/// The backend calls the client layer depends on, beyond
/// authentication.
///
/// All methods take the caller's access token explicitly: the backend
/// value itself is stateless about identity, which keeps it shareable
/// across tasks without locking.
pub trait Backend: AuthApi {
    /// Top records of a leaderboard, best first.
    fn list_leaderboard_records(
        &self,
        access_token: &str,
        leaderboard_id: &str,
        limit: u32,
    ) -> impl std::future::Future<Output = Result<Vec<LeaderboardRecord>, ApiError>> + Send;

    /// Records around one owner's position, for "where am I" views.
    fn list_leaderboard_records_around_owner(
        &self,
        access_token: &str,
        leaderboard_id: &str,
        owner_id: &str,
        limit: u32,
    ) -> impl std::future::Future<Output = Result<Vec<LeaderboardRecord>, ApiError>> + Send;

    /// Calls a named server RPC with a JSON payload and returns the
    /// JSON it answered with.
    fn rpc(
        &self,
        access_token: &str,
        id: &str,
        payload: serde_json::Value,
    ) -> impl std::future::Future<Output = Result<serde_json::Value, ApiError>> + Send;
}
