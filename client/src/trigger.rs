//! Trigger detection over the live trailing fragment.

use tagchat_protocol::Trigger;

/// Result of scanning the editable fragment for a trigger token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerScan {
    pub query: String,
    pub trigger: Option<Trigger>,
}

impl TriggerScan {
    pub fn none() -> Self {
        Self {
            query: String::new(),
            trigger: None,
        }
    }
}

/// Inspects only the last space-delimited token of the fragment. A `#` or
/// `@` prefix opens a session; the remainder is the query, and a
/// zero-length query is still a valid one (it asks for unfiltered top
/// results). Committed segments are never consulted.
pub fn parse(fragment: &str) -> TriggerScan {
    let last_word = fragment.split(' ').next_back().unwrap_or("");
    let mut chars = last_word.chars();
    match chars.next().and_then(Trigger::from_char) {
        Some(trigger) => TriggerScan {
            query: chars.as_str().to_string(),
            trigger: Some(trigger),
        },
        None => TriggerScan::none(),
    }
}
