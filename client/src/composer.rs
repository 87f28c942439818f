//! Committed message segments plus the live trailing fragment.

use chrono::Local;
use tagchat_protocol::{MessageDraft, MessageOrigin, Segment, Suggestion, Trigger};
use tracing::debug;

/// What a backspace keystroke did, so the input layer knows whether to fall
/// through to ordinary single-character deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackspaceEdit {
    /// The last committed segment was eaten whole.
    RemovedSegment(Segment),
    /// An in-progress, uncommitted trigger token was abandoned.
    ClearedTrailing,
    /// Plain character deletion; not this component's job.
    NotHandled,
}

/// Owns the ordered committed segments and the fragment being typed.
/// Segment identity is positional; two identical hashtags may coexist.
#[derive(Debug, Default)]
pub struct SegmentComposer {
    segments: Vec<Segment>,
    trailing: String,
}

impl SegmentComposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn trailing_text(&self) -> &str {
        &self.trailing
    }

    /// Replaces the live fragment. Trigger re-evaluation is the caller's
    /// responsibility, on every keystroke.
    pub fn set_trailing_text(&mut self, text: impl Into<String>) {
        self.trailing = text.into();
    }

    /// Commits a suggestion: the trigger token is stripped from the
    /// fragment, words before it survive as a text segment (when any), and
    /// the selection becomes a hashtag or mention token. The only mutation
    /// path that grows the segment list.
    pub fn commit_selection(&mut self, selection: &Suggestion, trigger: Trigger) {
        let mut words: Vec<&str> = self.trailing.split(' ').collect();
        words.pop();
        let text_before = words.join(" ");
        if !text_before.is_empty() {
            self.segments.push(Segment::Text {
                content: format!("{text_before} "),
            });
        }

        let segment = match trigger {
            Trigger::Hash => Segment::Hashtag {
                content: selection.name.clone(),
                id: selection.id.clone(),
            },
            Trigger::At => Segment::Mention {
                content: mention_handle(selection),
                id: selection.id.clone(),
                name: selection.name.clone(),
            },
        };
        debug!(segment = ?segment, "committed suggestion");
        self.segments.push(segment);
        self.trailing.clear();
    }

    /// Removes one rendered token. Positions past the end are ignored.
    pub fn remove_segment(&mut self, index: usize) -> Option<Segment> {
        if index < self.segments.len() {
            Some(self.segments.remove(index))
        } else {
            None
        }
    }

    /// Backspace policy over the token/fragment seam:
    /// 1. empty fragment + segments: eat the last committed segment;
    /// 2. caret at 0 on a fragment starting with a trigger: abandon the
    ///    whole uncommitted token;
    /// 3. caret at 0 otherwise, with segments: eat the last segment;
    /// 4. anything else is ordinary deletion, delegated to the input.
    pub fn backspace(&mut self, caret: usize) -> BackspaceEdit {
        if self.trailing.is_empty() {
            return match self.segments.pop() {
                Some(segment) => BackspaceEdit::RemovedSegment(segment),
                None => BackspaceEdit::NotHandled,
            };
        }

        if caret == 0 {
            if self
                .trailing
                .chars()
                .next()
                .and_then(Trigger::from_char)
                .is_some()
            {
                self.trailing.clear();
                return BackspaceEdit::ClearedTrailing;
            }
            if let Some(segment) = self.segments.pop() {
                return BackspaceEdit::RemovedSegment(segment);
            }
        }

        BackspaceEdit::NotHandled
    }

    /// Canonical plain-text form: each segment's display form, then the
    /// live fragment, trimmed. Doubles as the send-enabled check and the
    /// literal payload content.
    pub fn full_text(&self) -> String {
        let mut text = String::new();
        for segment in &self.segments {
            text.push_str(&segment.display_text());
        }
        text.push_str(&self.trailing);
        text.trim().to_string()
    }

    pub fn is_empty(&self) -> bool {
        self.full_text().is_empty()
    }

    /// Packages the draft for sending and clears the composer. Returns
    /// `None` (leaving state untouched) when the canonical text is empty.
    /// The timestamp is a localized 12-hour clock reading taken now.
    pub fn take_draft(&mut self) -> Option<MessageDraft> {
        let content = self.full_text();
        if content.is_empty() {
            return None;
        }
        Some(MessageDraft {
            origin: MessageOrigin::User,
            content,
            segments: std::mem::take(&mut self.segments),
            current_text: std::mem::take(&mut self.trailing),
            timestamp: Local::now().format("%I:%M %p").to_string(),
        })
    }
}

/// The service supplies no handle for user suggestions; synthesize one
/// from the display name, lower-cased with whitespace stripped.
fn mention_handle(selection: &Suggestion) -> String {
    selection.name.to_lowercase().split_whitespace().collect()
}
