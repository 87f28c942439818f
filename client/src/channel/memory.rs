//! In-memory channel for tests and embedders that have no real transport.

use super::{ChannelError, ChannelResult, EventChannel, EventStream};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tagchat_protocol::events::{ClientEvent, ServerEvent, ServerEventKind};
use tokio::sync::mpsc;
use uuid::Uuid;

struct Subscriber {
    id: Uuid,
    kinds: HashSet<ServerEventKind>,
    tx: mpsc::UnboundedSender<ServerEvent>,
}

/// Loopback channel: emitted client events surface on the receiver handed
/// out by [`MemoryChannel::new`]; server events are injected with
/// [`MemoryChannel::push`] and fanned out to interested subscribers.
pub struct MemoryChannel {
    outbound: mpsc::UnboundedSender<ClientEvent>,
    subscribers: Arc<Mutex<Vec<Subscriber>>>,
}

impl MemoryChannel {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<ClientEvent>) {
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let channel = Arc::new(Self {
            outbound,
            subscribers: Arc::new(Mutex::new(Vec::new())),
        });
        (channel, outbound_rx)
    }

    /// Delivers a server event to every subscriber interested in its kind.
    pub fn push(&self, event: ServerEvent) -> ChannelResult<()> {
        let kind = event.kind();
        let mut subscribers = self
            .subscribers
            .lock()
            .map_err(|_| ChannelError::Subscription("subscriber lock poisoned".into()))?;
        // Subscribers whose receiving side is gone are dropped on the way.
        subscribers.retain(|subscriber| {
            !subscriber.kinds.contains(&kind) || subscriber.tx.send(event.clone()).is_ok()
        });
        Ok(())
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().map(|s| s.len()).unwrap_or(0)
    }
}

impl EventChannel for MemoryChannel {
    fn emit(&self, event: ClientEvent) -> ChannelResult<()> {
        self.outbound.send(event).map_err(|_| ChannelError::Disconnected)
    }

    fn subscribe(&self, kinds: &[ServerEventKind]) -> ChannelResult<EventStream> {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        let mut subscribers = self
            .subscribers
            .lock()
            .map_err(|_| ChannelError::Subscription("subscriber lock poisoned".into()))?;
        subscribers.push(Subscriber {
            id,
            kinds: kinds.iter().copied().collect(),
            tx,
        });

        let registry = Arc::clone(&self.subscribers);
        Ok(EventStream::new(rx, move || {
            if let Ok(mut subscribers) = registry.lock() {
                subscribers.retain(|subscriber| subscriber.id != id);
            }
        }))
    }
}
