//! Bidirectional event envelopes. Event names are the compatibility
//! surface with the chat service; payload shapes mirror its wire format.

use crate::{Message, OutgoingMessage, Suggestion, Trigger};
use serde::{Deserialize, Serialize};

/// Events emitted by the client toward the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    AutocompleteRequest { query: String, trigger: Trigger },
    #[serde(rename_all = "camelCase")]
    LoadMessages { conversation_id: String },
    SendMessage(OutgoingMessage),
}

impl ClientEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::AutocompleteRequest { .. } => "autocomplete-request",
            Self::LoadMessages { .. } => "load-messages",
            Self::SendMessage(_) => "send-message",
        }
    }
}

/// Conversation metadata carried by list-refresh signals. The core does
/// not own conversation CRUD; these shapes exist for completeness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub updated_at: String,
}

/// Events pushed by the service toward the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    #[serde(rename_all = "camelCase")]
    AutocompleteResponse {
        suggestions: Vec<Suggestion>,
        query: String,
        trigger: Trigger,
    },
    AutocompleteError { error: String },
    #[serde(rename_all = "camelCase")]
    MessagesLoaded {
        conversation_id: String,
        messages: Vec<Message>,
    },
    MessagesError { error: String },
    NewMessage(Message),
    #[serde(rename_all = "camelCase")]
    BotTyping {
        conversation_id: String,
        is_typing: bool,
    },
    ConversationUpdated(ConversationSummary),
    #[serde(rename_all = "camelCase")]
    ConversationDeleted { conversation_id: String },
}

impl ServerEvent {
    pub fn kind(&self) -> ServerEventKind {
        match self {
            Self::AutocompleteResponse { .. } => ServerEventKind::AutocompleteResponse,
            Self::AutocompleteError { .. } => ServerEventKind::AutocompleteError,
            Self::MessagesLoaded { .. } => ServerEventKind::MessagesLoaded,
            Self::MessagesError { .. } => ServerEventKind::MessagesError,
            Self::NewMessage(_) => ServerEventKind::NewMessage,
            Self::BotTyping { .. } => ServerEventKind::BotTyping,
            Self::ConversationUpdated(_) => ServerEventKind::ConversationUpdated,
            Self::ConversationDeleted { .. } => ServerEventKind::ConversationDeleted,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }
}

/// Subscription keys for server events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServerEventKind {
    AutocompleteResponse,
    AutocompleteError,
    MessagesLoaded,
    MessagesError,
    NewMessage,
    BotTyping,
    ConversationUpdated,
    ConversationDeleted,
}

impl ServerEventKind {
    pub const ALL: [ServerEventKind; 8] = [
        Self::AutocompleteResponse,
        Self::AutocompleteError,
        Self::MessagesLoaded,
        Self::MessagesError,
        Self::NewMessage,
        Self::BotTyping,
        Self::ConversationUpdated,
        Self::ConversationDeleted,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::AutocompleteResponse => "autocomplete-response",
            Self::AutocompleteError => "autocomplete-error",
            Self::MessagesLoaded => "messages-loaded",
            Self::MessagesError => "messages-error",
            Self::NewMessage => "new-message",
            Self::BotTyping => "bot-typing",
            Self::ConversationUpdated => "conversation-updated",
            Self::ConversationDeleted => "conversation-deleted",
        }
    }
}
