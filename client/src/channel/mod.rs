//! Bidirectional event channel contract.
//!
//! The core only requires this interface from the transport: emit client
//! events by name, subscribe to server events by name. The connection
//! behind an implementation is expected to be a process-wide
//! connect-once/reuse resource; subscriptions follow component lifetimes.

mod memory;

pub use memory::MemoryChannel;

use tagchat_protocol::events::{ClientEvent, ServerEvent, ServerEventKind};
use tokio::sync::mpsc;

pub type ChannelResult<T> = Result<T, ChannelError>;

#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("channel disconnected")]
    Disconnected,
    #[error("subscription error: {0}")]
    Subscription(String),
    #[error("runtime error: {0}")]
    Runtime(String),
}

/// Contract the composition/sync core requires from the event transport.
pub trait EventChannel: Send + Sync {
    /// Fire-and-forget emit toward the service.
    fn emit(&self, event: ClientEvent) -> ChannelResult<()>;

    /// Registers interest in the given event kinds. The returned stream
    /// removes exactly the handlers it added when dropped.
    fn subscribe(&self, kinds: &[ServerEventKind]) -> ChannelResult<EventStream>;
}

/// Server events delivered to one subscriber, with teardown on drop so
/// every subscribe has its matching unsubscribe.
pub struct EventStream {
    events: mpsc::UnboundedReceiver<ServerEvent>,
    _teardown: TeardownGuard,
}

impl EventStream {
    pub fn new(
        events: mpsc::UnboundedReceiver<ServerEvent>,
        teardown: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            events,
            _teardown: TeardownGuard(Some(Box::new(teardown))),
        }
    }

    /// Next event, or `None` once the channel side is gone.
    pub async fn recv(&mut self) -> Option<ServerEvent> {
        self.events.recv().await
    }
}

struct TeardownGuard(Option<Box<dyn FnOnce() + Send>>);

impl Drop for TeardownGuard {
    fn drop(&mut self) {
        if let Some(teardown) = self.0.take() {
            teardown();
        }
    }
}
