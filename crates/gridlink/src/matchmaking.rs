//! The matchmaking coordinator.
//!
//! Matchmaking has two invariants the rest of the client leans on:
//!
//! 1. **At most one ticket.** `find_match` while a ticket is active
//!    returns that ticket; while a submission is in flight it joins the
//!    waiter list. Whatever the interleaving, one `AddMatchmaker` frame
//!    goes out per queue entry.
//! 2. **One match-found signal.** The server announces a pairing on two
//!    channels (a matchmaker event and a notification), and both may
//!    arrive. The first one wins; the duplicate is dropped by match id.

use std::sync::Arc;

use tokio::sync::oneshot;

use gridlink_api::Backend;
use gridlink_protocol::{ClientRequest, MatchId, ServerMessage, Ticket};
use gridlink_session::CredentialStore;
use gridlink_transport::Connector;

use crate::{GridlinkError, client::ClientInner};

/// Matchmaking state, guarded by the client's async mutex.
#[derive(Default)]
pub(crate) struct MatchmakingState {
    /// The active ticket while queued.
    pub(crate) ticket: Option<Ticket>,

    /// Waiters for an in-flight enqueue, or `None` when no submission
    /// is running.
    pending: Option<Vec<oneshot::Sender<Result<Ticket, String>>>>,

    /// The match id already announced to the callback. A second signal
    /// carrying the same id is the duplicate delivery channel, not a
    /// new match.
    resolved: Option<MatchId>,
}

impl<B, C, S> ClientInner<B, C, S>
where
    B: Backend,
    C: Connector,
    S: CredentialStore,
{
    /// Queues for a match and returns the ticket.
    ///
    /// Requires a valid session and a live connection; `connect` is
    /// invoked first and provides both.
    pub(crate) async fn find_match(self: Arc<Self>) -> Result<Ticket, GridlinkError> {
        Arc::clone(&self).connect().await?;

        let rx = {
            let mut matchmaking = self.matchmaking.lock().await;
            if let Some(ticket) = &matchmaking.ticket {
                tracing::debug!(%ticket, "already queued, returning the active ticket");
                return Ok(ticket.clone());
            }

            let (tx, rx) = oneshot::channel();
            match &mut matchmaking.pending {
                Some(waiters) => waiters.push(tx),
                None => {
                    matchmaking.pending = Some(vec![tx]);
                    // The submission runs in its own task: if the caller
                    // is cancelled, the enqueue still completes and the
                    // other waiters still get their ticket.
                    let inner = Arc::clone(&self);
                    tokio::spawn(async move { inner.run_matchmaker_submit().await });
                }
            }
            rx
        };

        match rx.await {
            Ok(Ok(ticket)) => Ok(ticket),
            Ok(Err(message)) => Err(GridlinkError::Matchmaking(message)),
            Err(_) => Err(GridlinkError::Matchmaking(
                "matchmaker submission abandoned".to_string(),
            )),
        }
    }

    /// The single enqueue for one batch of `find_match` callers.
    async fn run_matchmaker_submit(self: Arc<Self>) {
        let result = self.submit_matchmaker().await;

        let waiters = {
            let mut matchmaking = self.matchmaking.lock().await;
            match &result {
                Ok(ticket) => {
                    matchmaking.ticket = Some(ticket.clone());
                    // A fresh queue entry may legitimately resolve to a
                    // match id seen in an earlier game.
                    matchmaking.resolved = None;
                    tracing::info!(%ticket, "queued for a match");
                }
                Err(message) => {
                    tracing::warn!(%message, "matchmaker enqueue failed");
                }
            }
            matchmaking.pending.take().unwrap_or_default()
        };

        for tx in waiters {
            let _ = tx.send(result.clone());
        }
    }

    async fn submit_matchmaker(&self) -> Result<Ticket, String> {
        let Some(link) = self.current_link().await else {
            return Err("socket is not connected".to_string());
        };

        let request = ClientRequest::AddMatchmaker {
            query: "*".to_string(),
            min_count: 2,
            max_count: 2,
        };

        match link.request(request).await {
            Ok(ServerMessage::MatchmakerTicket { ticket }) => Ok(ticket),
            Ok(ServerMessage::Error { code, message }) => {
                Err(format!("server rejected the enqueue ({code}): {message}"))
            }
            Ok(other) => Err(format!("unexpected matchmaker reply: {other:?}")),
            Err(e) => Err(e.to_string()),
        }
    }

    /// Leaves the matchmaker pool.
    ///
    /// With no active ticket this is a warning and `Ok`. Otherwise the
    /// local ticket is cleared whatever the server says about the
    /// removal; only session errors surface.
    pub(crate) async fn cancel_matchmaking(&self) -> Result<(), GridlinkError> {
        let ticket = {
            let matchmaking = self.matchmaking.lock().await;
            match &matchmaking.ticket {
                Some(ticket) => ticket.clone(),
                None => {
                    tracing::warn!("cancel_matchmaking called with no active ticket");
                    return Ok(());
                }
            }
        };

        self.ensure_valid_session().await?;

        if let Some(link) = self.current_link().await {
            let request = ClientRequest::RemoveMatchmaker {
                ticket: ticket.clone(),
            };
            match link.request(request).await {
                Ok(ServerMessage::Ack) => tracing::info!(%ticket, "left the matchmaker pool"),
                Ok(ServerMessage::Error { code, message }) => {
                    tracing::warn!(code, %message, "server rejected the removal");
                }
                Ok(other) => tracing::warn!(?other, "unexpected removal reply"),
                Err(e) => tracing::warn!(error = %e, "failed to send the removal"),
            }
        } else {
            tracing::warn!("cancelling matchmaking without a connection");
        }

        let mut matchmaking = self.matchmaking.lock().await;
        if matchmaking.ticket.as_ref() == Some(&ticket) {
            matchmaking.ticket = None;
        }
        Ok(())
    }

    /// The idempotent funnel for both match-found channels.
    pub(crate) async fn handle_match_found(&self, match_id: MatchId) {
        {
            let mut matchmaking = self.matchmaking.lock().await;
            if matchmaking.resolved.as_ref() == Some(&match_id) {
                tracing::debug!(%match_id, "duplicate match-found signal dropped");
                return;
            }
            matchmaking.resolved = Some(match_id.clone());
            matchmaking.ticket = None;
        }

        tracing::info!(%match_id, "match found");
        self.callbacks.notify_match_found(match_id);
    }

    pub(crate) async fn current_ticket(&self) -> Option<Ticket> {
        self.matchmaking.lock().await.ticket.clone()
    }

    /// Drops all matchmaking state. Used by logout.
    pub(crate) async fn reset_matchmaking(&self) {
        *self.matchmaking.lock().await = MatchmakingState::default();
    }
}
