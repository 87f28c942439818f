//! Authoritative per-conversation message state, reconciled against the
//! service's event stream. Arrival order is append order; the channel's
//! delivery order is authoritative.

use tagchat_protocol::events::ClientEvent;
use tagchat_protocol::{Message, MessageDraft, OutgoingMessage};
use tracing::{debug, warn};

/// Owns the committed message list and the typing flag for the active
/// conversation. Mutated only through these operations; the rendering
/// layer reads snapshots.
#[derive(Debug, Default)]
pub struct MessageSynchronizer {
    active_conversation: Option<String>,
    messages: Vec<Message>,
    is_loading: bool,
    is_bot_typing: bool,
}

impl MessageSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_conversation(&self) -> Option<&str> {
        self.active_conversation.as_deref()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn is_bot_typing(&self) -> bool {
        self.is_bot_typing
    }

    /// Switches the active conversation. `None` clears the list
    /// synchronously with no request; otherwise returns the history load
    /// request to emit. Interest in any in-flight load for the previous
    /// conversation lapses via the id-match guard below.
    pub fn load_conversation(&mut self, conversation_id: Option<String>) -> Option<ClientEvent> {
        self.is_bot_typing = false;
        match conversation_id {
            None => {
                self.active_conversation = None;
                self.messages.clear();
                self.is_loading = false;
                None
            }
            Some(id) => {
                self.active_conversation = Some(id.clone());
                self.is_loading = true;
                Some(ClientEvent::LoadMessages { conversation_id: id })
            }
        }
    }

    /// History result. A response for anything but the currently active
    /// conversation arrived after the user navigated away; drop it.
    pub fn on_messages_loaded(&mut self, conversation_id: &str, messages: Vec<Message>) {
        if self.active_conversation.as_deref() != Some(conversation_id) {
            debug!(conversation_id, "discarding history for inactive conversation");
            return;
        }
        self.messages = messages;
        self.is_loading = false;
    }

    /// History failure: logged, loading cleared, no retry.
    pub fn on_messages_error(&mut self, error: &str) {
        warn!(error, "failed to load conversation history");
        self.is_loading = false;
    }

    /// Idempotent insert: appended only when addressed to the active
    /// conversation and no existing message shares the id, so duplicate
    /// channel deliveries are absorbed.
    pub fn receive_push(&mut self, message: Message) {
        let Some(active) = self.active_conversation.as_deref() else {
            return;
        };
        if message.conversation_id.as_deref() != Some(active) {
            debug!(
                conversation_id = ?message.conversation_id,
                "push for inactive conversation ignored"
            );
            return;
        }
        if self.messages.iter().any(|m| m.id == message.id) {
            debug!(id = message.id.as_str(), "duplicate message delivery ignored");
            return;
        }
        self.messages.push(message);
    }

    /// Typing flag is explicit signal state, never inferred locally.
    pub fn set_typing(&mut self, conversation_id: &str, is_typing: bool) {
        if self.active_conversation.as_deref() == Some(conversation_id) {
            self.is_bot_typing = is_typing;
        }
    }

    /// Emits the structured send event. The message joins the list only
    /// when it echoes back through `receive_push` — never optimistically,
    /// so a dropped emit never shows a message the far end never recorded.
    pub fn send(&self, draft: MessageDraft) -> Option<ClientEvent> {
        let conversation_id = self.active_conversation.clone()?;
        Some(ClientEvent::SendMessage(OutgoingMessage::new(
            conversation_id,
            draft,
        )))
    }

    /// Deleting the active conversation elsewhere clears it here.
    pub fn on_conversation_deleted(&mut self, conversation_id: &str) {
        if self.active_conversation.as_deref() == Some(conversation_id) {
            self.load_conversation(None);
        }
    }
}
