//! Callback registry for server-pushed events.
//!
//! The reader task is the only caller of the `notify_*` methods, so
//! events reach handlers in arrival order. Each slot holds at most one
//! handler; registering again replaces the previous one. Handlers run
//! synchronously on the reader task and should hand heavy work to their
//! own tasks.

use std::sync::{Arc, Mutex};

use gridlink_protocol::{MatchDataEvent, MatchId, MatchPresenceEvent};

use crate::client::lock;

type MatchFoundHandler = Arc<dyn Fn(MatchId) + Send + Sync>;
type MatchDataHandler = Arc<dyn Fn(MatchDataEvent) + Send + Sync>;
type MatchPresenceHandler = Arc<dyn Fn(MatchPresenceEvent) + Send + Sync>;

/// One slot per event kind, last registration wins.
#[derive(Default)]
pub(crate) struct Callbacks {
    match_found: Mutex<Option<MatchFoundHandler>>,
    match_data: Mutex<Option<MatchDataHandler>>,
    match_presence: Mutex<Option<MatchPresenceHandler>>,
}

impl Callbacks {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set_match_found(&self, handler: impl Fn(MatchId) + Send + Sync + 'static) {
        *lock(&self.match_found) = Some(Arc::new(handler));
    }

    pub(crate) fn set_match_data(&self, handler: impl Fn(MatchDataEvent) + Send + Sync + 'static) {
        *lock(&self.match_data) = Some(Arc::new(handler));
    }

    pub(crate) fn set_match_presence(
        &self,
        handler: impl Fn(MatchPresenceEvent) + Send + Sync + 'static,
    ) {
        *lock(&self.match_presence) = Some(Arc::new(handler));
    }

    pub(crate) fn notify_match_found(&self, match_id: MatchId) {
        // Clone the handler out first; the slot lock must not be held
        // during the call, because a handler may call back into the
        // client and re-register.
        let handler = lock(&self.match_found).clone();
        match handler {
            Some(handler) => handler(match_id),
            None => tracing::debug!(%match_id, "match found but no handler registered"),
        }
    }

    pub(crate) fn notify_match_data(&self, event: MatchDataEvent) {
        let handler = lock(&self.match_data).clone();
        match handler {
            Some(handler) => handler(event),
            None => tracing::debug!("match data with no handler registered"),
        }
    }

    pub(crate) fn notify_match_presence(&self, event: MatchPresenceEvent) {
        let handler = lock(&self.match_presence).clone();
        match handler {
            Some(handler) => handler(event),
            None => tracing::debug!("presence event with no handler registered"),
        }
    }

    /// Drops all handlers. Part of logout: a stale handler from the
    /// previous identity must not observe the next one's events.
    pub(crate) fn clear(&self) {
        *lock(&self.match_found) = None;
        *lock(&self.match_data) = None;
        *lock(&self.match_presence) = None;
    }
}

// =========================================================================
// Tests
// =========================================================================
