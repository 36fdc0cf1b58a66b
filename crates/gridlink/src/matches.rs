//! Match join, moves, and the inbound match-data path.
//!
//! The client tracks exactly one "active match" handle. It is set
//! optimistically when a join starts, cleared on join failure, on
//! `leave_match`, on disconnect, and when the server reports the game
//! over or the opponent gone.

use std::sync::Arc;

use gridlink_api::Backend;
use gridlink_protocol::{
    ClientRequest, MatchDataEvent, MatchId, MatchInfo, MatchMessage, MovePayload, OpCode,
    ServerMessage, codec,
};
use gridlink_session::CredentialStore;
use gridlink_transport::Connector;

use crate::{
    GridlinkError,
    client::{ClientInner, lock},
};

impl<B, C, S> ClientInner<B, C, S>
where
    B: Backend,
    C: Connector,
    S: CredentialStore,
{
    /// Joins a match found via matchmaking or created directly.
    ///
    /// The active match handle is set before the join request goes out,
    /// so match events racing the reply already see an active match. On
    /// any failure the handle is cleared again: either the client is in
    /// the match, or no trace of the attempt remains.
    pub(crate) async fn join_match(
        self: Arc<Self>,
        match_id: &MatchId,
    ) -> Result<MatchInfo, GridlinkError> {
        Arc::clone(&self).connect().await?;
        let Some(link) = self.current_link().await else {
            return Err(GridlinkError::NotConnected);
        };

        *lock(&self.active_match) = Some(match_id.clone());

        let request = ClientRequest::JoinMatch {
            match_id: match_id.clone(),
        };
        match link.request(request).await {
            Ok(ServerMessage::MatchJoined {
                match_id,
                presences,
            }) => {
                tracing::info!(%match_id, players = presences.len(), "joined match");
                Ok(MatchInfo {
                    match_id,
                    presences,
                })
            }
            Ok(ServerMessage::Error { code, message }) => {
                self.clear_active_match();
                Err(GridlinkError::MatchJoin(format!(
                    "server rejected the join ({code}): {message}"
                )))
            }
            Ok(other) => {
                self.clear_active_match();
                Err(GridlinkError::MatchJoin(format!(
                    "unexpected join reply: {other:?}"
                )))
            }
            Err(e) => {
                self.clear_active_match();
                Err(GridlinkError::MatchJoin(e.to_string()))
            }
        }
    }

    /// Sends our move at `position` (0 through 8), fire and forget.
    ///
    /// The connection check comes first: after a dropped socket the
    /// stale handle would otherwise turn every move into `NotInMatch`,
    /// which points at the wrong problem.
    pub(crate) async fn send_move(&self, position: u8) -> Result<(), GridlinkError> {
        let Some(link) = self.current_link().await else {
            return Err(GridlinkError::NotConnected);
        };
        let Some(match_id) = lock(&self.active_match).clone() else {
            return Err(GridlinkError::NotInMatch);
        };

        let data = codec::encode(&MovePayload { position })?;
        link.send(ClientRequest::MatchDataSend {
            match_id,
            op_code: OpCode::Move.code(),
            data,
        })
        .await?;

        tracing::debug!(position, "move sent");
        Ok(())
    }

    /// Leaves the current match.
    ///
    /// The handle is cleared unconditionally; telling the server is
    /// best effort. A dead socket at this point is routine (the match
    /// may be over because the connection dropped), not an error.
    pub(crate) async fn leave_match(&self) -> Result<(), GridlinkError> {
        let Some(match_id) = lock(&self.active_match).take() else {
            tracing::warn!("leave_match called with no active match");
            return Ok(());
        };

        match self.current_link().await {
            Some(link) => {
                let request = ClientRequest::LeaveMatch {
                    match_id: match_id.clone(),
                };
                if let Err(e) = link.send(request).await {
                    tracing::warn!(error = %e, "failed to send the leave");
                }
            }
            None => tracing::warn!("leaving a match without a connection"),
        }

        tracing::info!(%match_id, "left match");
        Ok(())
    }

    /// Decodes an inbound match-data frame and hands it to the
    /// callback. Terminal op codes clear the active match first, so a
    /// handler that calls back into the client sees the final state.
    pub(crate) fn handle_match_data(&self, match_id: MatchId, op_code: i64, data: &[u8]) {
        let op_code = match OpCode::try_from(op_code) {
            Ok(op_code) => op_code,
            Err(e) => {
                tracing::warn!(error = %e, "dropping match data");
                return;
            }
        };
        let message = match MatchMessage::decode(op_code, data) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(%op_code, error = %e, "dropping malformed match data");
                return;
            }
        };

        if matches!(op_code, OpCode::GameOver | OpCode::OpponentLeft) {
            self.clear_active_match();
        }

        self.callbacks.notify_match_data(MatchDataEvent {
            match_id,
            op_code,
            message,
        });
    }

    pub(crate) fn current_match_id(&self) -> Option<MatchId> {
        lock(&self.active_match).clone()
    }

    pub(crate) fn clear_active_match(&self) {
        if lock(&self.active_match).take().is_some() {
            tracing::debug!("active match cleared");
        }
    }
}
