//! Suggestion session lifecycle and debounced request scheduling.

use crate::trigger::TriggerScan;
use serde::Serialize;
use std::time::Duration;
use tagchat_protocol::{OverlayAnchor, Suggestion, Trigger};
use tokio::time::Instant;
use tracing::{debug, warn};

/// Outgoing request tagged with the query/trigger it was issued for, so a
/// late response can be checked against the session it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    pub query: String,
    pub trigger: Trigger,
}

/// Ephemeral open/closed state of the suggestion overlay.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SuggestionSession {
    pub is_open: bool,
    pub query: String,
    pub trigger: Option<Trigger>,
    pub anchor: Option<OverlayAnchor>,
    pub items: Vec<Suggestion>,
    pub selected: usize,
    pub is_loading: bool,
}

/// Owns debounce timing, request/response correlation, and the open/closed
/// lifecycle of the suggestion list. At most one pending request exists; a
/// new trigger detection supersedes any in-flight one.
pub struct SuggestionCoordinator {
    session: SuggestionSession,
    debounce: Duration,
    pending: Option<(PendingRequest, Instant)>,
}

impl SuggestionCoordinator {
    pub fn new(debounce: Duration) -> Self {
        Self {
            session: SuggestionSession::default(),
            debounce,
            pending: None,
        }
    }

    pub fn session(&self) -> &SuggestionSession {
        &self.session
    }

    /// Reacts to a re-parse of the trailing fragment. Without a trigger the
    /// session closes synchronously. With one, the session opens right away
    /// so the overlay shows a loading state before the round-trip, and the
    /// remote request is (re)scheduled: immediately for an empty query,
    /// debounced otherwise.
    pub fn on_query_changed(&mut self, scan: &TriggerScan, anchor: OverlayAnchor) {
        let Some(trigger) = scan.trigger else {
            self.close();
            return;
        };

        self.session.is_open = true;
        self.session.query = scan.query.clone();
        self.session.trigger = Some(trigger);
        self.session.anchor = Some(anchor);
        self.session.is_loading = true;
        self.session.selected = 0;

        let query = scan.query.trim().to_string();
        let delay = if query.is_empty() {
            Duration::ZERO
        } else {
            self.debounce
        };
        // Rescheduling drops any previously pending request.
        self.pending = Some((PendingRequest { query, trigger }, Instant::now() + delay));
    }

    /// Deadline of the pending debounced request, if any.
    pub fn debounce_deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, due)| *due)
    }

    /// Takes the pending request once its deadline has passed.
    pub fn take_due(&mut self, now: Instant) -> Option<PendingRequest> {
        match &self.pending {
            Some((_, due)) if *due <= now => self.pending.take().map(|(request, _)| request),
            _ => None,
        }
    }

    /// Applies a response, unless it answers a query that is no longer the
    /// one on display; a slow response for a superseded query must never
    /// clobber the newer session's list.
    pub fn apply_response(&mut self, suggestions: Vec<Suggestion>, query: &str, trigger: Trigger) {
        if !self.session.is_open {
            debug!(query, "suggestion response with no open session");
            return;
        }
        if self.session.trigger != Some(trigger) || self.session.query.trim() != query {
            debug!(
                query,
                current = self.session.query.as_str(),
                "discarding stale suggestion response"
            );
            return;
        }
        self.session.is_loading = false;
        self.session.items = suggestions;
        self.session.selected = 0;
    }

    /// Fail-closed: the overlay disappears, the next keystroke re-requests.
    pub fn apply_error(&mut self, error: &str) {
        warn!(error, "suggestion request failed, closing overlay");
        self.close();
    }

    /// Closes the session and invalidates any pending debounce.
    pub fn close(&mut self) {
        self.pending = None;
        self.session = SuggestionSession::default();
    }

    pub fn move_cursor_down(&mut self) {
        if self.session.selected + 1 < self.session.items.len() {
            self.session.selected += 1;
        }
    }

    pub fn move_cursor_up(&mut self) {
        self.session.selected = self.session.selected.saturating_sub(1);
    }

    /// Closes the session and hands the chosen entry to the caller; the
    /// composer owns what happens to it next.
    pub fn select(&mut self, index: usize) -> Option<Suggestion> {
        let item = self.session.items.get(index).cloned()?;
        self.close();
        Some(item)
    }

    pub fn select_current(&mut self) -> Option<Suggestion> {
        self.select(self.session.selected)
    }
}
