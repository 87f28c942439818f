//! Single-threaded cooperative event loop for the client core.
//!
//! Input commands, server events, and the suggestion debounce timer
//! interleave through one `select!` loop; every handler runs to completion
//! before the next event is taken, so no state is mutated concurrently.

use crate::channel::{ChannelError, ChannelResult, EventChannel, EventStream};
use crate::composer::{BackspaceEdit, SegmentComposer};
use crate::config::ClientConfig;
use crate::suggestions::{SuggestionCoordinator, SuggestionSession};
use crate::sync::MessageSynchronizer;
use crate::trigger;
use serde::Serialize;
use std::sync::Arc;
use tagchat_protocol::events::{ClientEvent, ServerEvent, ServerEventKind};
use tagchat_protocol::{Message, OverlayAnchor, Segment};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, warn};

/// Commands sent from the input layer to the runtime.
#[derive(Debug)]
pub enum InputCommand {
    /// The live fragment changed; re-evaluates trigger detection.
    TextEdited { text: String, anchor: OverlayAnchor },
    /// Backspace pressed with the caret at the given byte offset.
    Backspace { caret: usize },
    CursorUp,
    CursorDown,
    /// Enter: commits the highlighted suggestion when the overlay is
    /// showing entries, sends the composed message otherwise.
    Confirm,
    Escape,
    SelectSuggestion(usize),
    RemoveSegment(usize),
    OpenConversation(Option<String>),
    Send,
    Shutdown(oneshot::Sender<()>),
}

/// Read-only view published to the rendering layer after every event.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ClientSnapshot {
    pub active_conversation: Option<String>,
    pub messages: Vec<Message>,
    pub is_loading: bool,
    pub is_bot_typing: bool,
    pub segments: Vec<Segment>,
    pub trailing_text: String,
    pub full_text: String,
    pub suggestions: SuggestionSession,
}

/// Handle for the input and rendering layers: commands in, snapshots out.
pub struct ClientHandle {
    commands: mpsc::UnboundedSender<InputCommand>,
    snapshots: watch::Receiver<ClientSnapshot>,
    runtime_task: tokio::task::JoinHandle<()>,
}

impl ClientHandle {
    pub fn command(&self, command: InputCommand) -> ChannelResult<()> {
        self.commands
            .send(command)
            .map_err(|_| ChannelError::Disconnected)
    }

    pub fn snapshots(&self) -> watch::Receiver<ClientSnapshot> {
        self.snapshots.clone()
    }

    pub async fn shutdown(self) -> ChannelResult<()> {
        let (done_tx, done_rx) = oneshot::channel();
        self.commands
            .send(InputCommand::Shutdown(done_tx))
            .map_err(|_| ChannelError::Disconnected)?;
        done_rx
            .await
            .map_err(|e| ChannelError::Runtime(format!("shutdown ack error: {e}")))?;
        self.runtime_task
            .await
            .map_err(|e| ChannelError::Runtime(format!("runtime join error: {e}")))?;
        Ok(())
    }
}

pub struct ClientRuntime {
    channel: Arc<dyn EventChannel>,
    events: EventStream,
    command_rx: mpsc::UnboundedReceiver<InputCommand>,
    snapshot_tx: watch::Sender<ClientSnapshot>,
    composer: SegmentComposer,
    suggestions: SuggestionCoordinator,
    sync: MessageSynchronizer,
}

impl ClientRuntime {
    /// Subscribes to the server events the core consumes and spawns the
    /// event loop. The subscription is torn down when the loop exits.
    pub fn start(config: ClientConfig, channel: Arc<dyn EventChannel>) -> ChannelResult<ClientHandle> {
        let events = channel.subscribe(&[
            ServerEventKind::AutocompleteResponse,
            ServerEventKind::AutocompleteError,
            ServerEventKind::MessagesLoaded,
            ServerEventKind::MessagesError,
            ServerEventKind::NewMessage,
            ServerEventKind::BotTyping,
            ServerEventKind::ConversationDeleted,
        ])?;

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(ClientSnapshot::default());

        let runtime = Self {
            channel,
            events,
            command_rx,
            snapshot_tx,
            composer: SegmentComposer::new(),
            suggestions: SuggestionCoordinator::new(config.suggestion_debounce),
            sync: MessageSynchronizer::new(),
        };
        let runtime_task = tokio::spawn(runtime.run());

        Ok(ClientHandle {
            commands: command_tx,
            snapshots: snapshot_rx,
            runtime_task,
        })
    }

    async fn run(mut self) {
        self.publish_snapshot();

        loop {
            let deadline = self.suggestions.debounce_deadline();
            tokio::select! {
                command = self.command_rx.recv() => {
                    match command {
                        Some(InputCommand::Shutdown(done_tx)) => {
                            let _ = done_tx.send(());
                            break;
                        }
                        Some(command) => {
                            self.handle_command(command);
                            self.publish_snapshot();
                        }
                        None => break,
                    }
                }
                event = self.events.recv() => {
                    match event {
                        Some(event) => {
                            self.handle_server_event(event);
                            self.publish_snapshot();
                        }
                        None => {
                            warn!("event channel closed, stopping runtime");
                            break;
                        }
                    }
                }
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.flush_debounce();
                }
            }
        }
    }

    fn handle_command(&mut self, command: InputCommand) {
        match command {
            InputCommand::TextEdited { text, anchor } => {
                self.composer.set_trailing_text(text);
                let scan = trigger::parse(self.composer.trailing_text());
                self.suggestions.on_query_changed(&scan, anchor);
            }
            InputCommand::Backspace { caret } => match self.composer.backspace(caret) {
                BackspaceEdit::ClearedTrailing => {
                    // The trigger token is gone, so is the session.
                    self.suggestions.close();
                }
                BackspaceEdit::RemovedSegment(segment) => {
                    debug!(?segment, "backspace removed a committed segment");
                }
                BackspaceEdit::NotHandled => {}
            },
            InputCommand::CursorUp => self.suggestions.move_cursor_up(),
            InputCommand::CursorDown => self.suggestions.move_cursor_down(),
            InputCommand::Escape => self.suggestions.close(),
            InputCommand::Confirm => {
                let session = self.suggestions.session();
                if session.is_open && !session.items.is_empty() {
                    let index = session.selected;
                    self.commit_suggestion_at(index);
                } else {
                    self.send_message();
                }
            }
            InputCommand::SelectSuggestion(index) => self.commit_suggestion_at(index),
            InputCommand::RemoveSegment(index) => {
                self.composer.remove_segment(index);
            }
            InputCommand::OpenConversation(conversation_id) => {
                // Composer and overlay are session-scoped to one conversation.
                self.composer = SegmentComposer::new();
                self.suggestions.close();
                if let Some(event) = self.sync.load_conversation(conversation_id) {
                    self.emit(event);
                }
            }
            InputCommand::Send => self.send_message(),
            InputCommand::Shutdown(_) => unreachable!("handled by the event loop"),
        }
    }

    fn handle_server_event(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::AutocompleteResponse { suggestions, query, trigger } => {
                self.suggestions.apply_response(suggestions, &query, trigger);
            }
            ServerEvent::AutocompleteError { error } => self.suggestions.apply_error(&error),
            ServerEvent::MessagesLoaded { conversation_id, messages } => {
                self.sync.on_messages_loaded(&conversation_id, messages);
            }
            ServerEvent::MessagesError { error } => self.sync.on_messages_error(&error),
            ServerEvent::NewMessage(message) => self.sync.receive_push(message),
            ServerEvent::BotTyping { conversation_id, is_typing } => {
                self.sync.set_typing(&conversation_id, is_typing);
            }
            ServerEvent::ConversationDeleted { conversation_id } => {
                self.sync.on_conversation_deleted(&conversation_id);
            }
            ServerEvent::ConversationUpdated(_) => {
                // Sidebar refresh signal; nothing in the core to update.
            }
        }
    }

    fn commit_suggestion_at(&mut self, index: usize) {
        let Some(trigger) = self.suggestions.session().trigger else {
            return;
        };
        if let Some(selection) = self.suggestions.select(index) {
            self.composer.commit_selection(&selection, trigger);
        }
    }

    fn send_message(&mut self) {
        let Some(draft) = self.composer.take_draft() else {
            debug!("ignoring send for an empty composer");
            return;
        };
        match self.sync.send(draft) {
            Some(event) => self.emit(event),
            None => debug!("no active conversation, dropping send"),
        }
    }

    fn flush_debounce(&mut self) {
        if let Some(request) = self.suggestions.take_due(Instant::now()) {
            self.emit(ClientEvent::AutocompleteRequest {
                query: request.query,
                trigger: request.trigger,
            });
        }
    }

    fn emit(&self, event: ClientEvent) {
        let name = event.name();
        if let Err(err) = self.channel.emit(event) {
            warn!(%err, event = name, "failed to emit client event");
        }
    }

    fn publish_snapshot(&self) {
        self.snapshot_tx.send_replace(ClientSnapshot {
            active_conversation: self.sync.active_conversation().map(str::to_string),
            messages: self.sync.messages().to_vec(),
            is_loading: self.sync.is_loading(),
            is_bot_typing: self.sync.is_bot_typing(),
            segments: self.composer.segments().to_vec(),
            trailing_text: self.composer.trailing_text().to_string(),
            full_text: self.composer.full_text(),
            suggestions: self.suggestions.session().clone(),
        });
    }
}
