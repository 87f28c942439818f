//! Wire models shared between the TagChat client core and the chat service.

pub mod events;

use serde::de::{self, Deserializer, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Character that opens a suggestion session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    /// `#` — hashtag suggestions.
    Hash,
    /// `@` — mention suggestions.
    At,
}

impl Trigger {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '#' => Some(Self::Hash),
            '@' => Some(Self::At),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Self::Hash => '#',
            Self::At => '@',
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

// On the wire a trigger is its literal character, "#" or "@".
impl Serialize for Trigger {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut buf = [0u8; 4];
        serializer.serialize_str(self.as_char().encode_utf8(&mut buf))
    }
}

impl<'de> Deserialize<'de> for Trigger {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TriggerVisitor;

        impl Visitor<'_> for TriggerVisitor {
            type Value = Trigger;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("\"#\" or \"@\"")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Trigger, E> {
                let mut chars = value.chars();
                match (chars.next().and_then(Trigger::from_char), chars.next()) {
                    (Some(trigger), None) => Ok(trigger),
                    _ => Err(E::invalid_value(de::Unexpected::Str(value), &self)),
                }
            }
        }

        deserializer.deserialize_str(TriggerVisitor)
    }
}

/// One atomic unit of a composed message. `content` never carries the
/// trigger character; display adds it back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Segment {
    Text { content: String },
    Hashtag { content: String, id: String },
    Mention { content: String, id: String, name: String },
}

impl Segment {
    /// Canonical display form: tokens get their trigger prefix and a
    /// trailing space so concatenation stays readable.
    pub fn display_text(&self) -> String {
        match self {
            Self::Text { content } => content.clone(),
            Self::Hashtag { content, .. } => format!("#{content} "),
            Self::Mention { content, .. } => format!("@{content} "),
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Self::Text { content } | Self::Hashtag { content, .. } | Self::Mention { content, .. } => {
                content
            }
        }
    }
}

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageOrigin {
    User,
    Bot,
}

/// A committed chat message, immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    #[serde(rename = "type")]
    pub origin: MessageOrigin,
    pub content: String,
    pub segments: Vec<Segment>,
    pub current_text: String,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

impl Message {
    /// Builds a message with a fresh id, as the service does when it
    /// records a send or generates a bot reply.
    pub fn new(
        origin: MessageOrigin,
        content: impl Into<String>,
        segments: Vec<Segment>,
        timestamp: impl Into<String>,
        conversation_id: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            origin,
            content: content.into(),
            segments,
            current_text: String::new(),
            timestamp: timestamp.into(),
            conversation_id: Some(conversation_id.into()),
        }
    }
}

/// Draft packaged by the composer at send time; the synchronizer attaches
/// the active conversation before it goes on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDraft {
    #[serde(rename = "type")]
    pub origin: MessageOrigin,
    pub content: String,
    pub segments: Vec<Segment>,
    pub current_text: String,
    pub timestamp: String,
}

/// `send-message` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingMessage {
    pub conversation_id: String,
    #[serde(rename = "type")]
    pub origin: MessageOrigin,
    pub content: String,
    pub segments: Vec<Segment>,
    pub current_text: String,
    pub timestamp: String,
}

impl OutgoingMessage {
    pub fn new(conversation_id: impl Into<String>, draft: MessageDraft) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            origin: draft.origin,
            content: draft.content,
            segments: draft.segments,
            current_text: draft.current_text,
            timestamp: draft.timestamp,
        }
    }
}

/// Kind of entry returned by the suggestion service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    User,
    Hashtag,
}

/// Immutable suggestion snapshot for one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SuggestionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// Screen position anchoring the suggestion overlay to the input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OverlayAnchor {
    pub top: f64,
    pub left: f64,
}
