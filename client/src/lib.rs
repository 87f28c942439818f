//! Composition and synchronization core for the TagChat client.
//!
//! The core turns raw keystrokes into structured messages (plain text,
//! hashtag and mention segments), drives the debounced suggestion
//! protocol, and reconciles the per-conversation message list against the
//! service's event stream. Rendering, navigation, and conversation CRUD
//! live outside this crate and only read the published snapshots.

pub mod channel;
pub mod composer;
pub mod config;
pub mod runtime;
pub mod suggestions;
pub mod sync;
pub mod trigger;

pub use channel::{ChannelError, EventChannel, EventStream, MemoryChannel};
pub use composer::{BackspaceEdit, SegmentComposer};
pub use config::ClientConfig;
pub use runtime::{ClientHandle, ClientRuntime, ClientSnapshot, InputCommand};
pub use suggestions::{SuggestionCoordinator, SuggestionSession};
pub use sync::MessageSynchronizer;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
