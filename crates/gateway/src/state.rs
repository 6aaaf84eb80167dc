use std::sync::Arc;

use tokio::sync::broadcast;

use {
    chirp_chat::{ChatService, MessageEvent},
    chirp_store::MessageStore,
};

use crate::ws::BroadcastSink;

/// Buffered events per WebSocket subscriber before lagging clients drop.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Shared app state: the pipeline service plus the event fan-out channel.
#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<ChatService>,
    pub events: broadcast::Sender<MessageEvent>,
    pub verify_token: Option<String>,
}

impl AppState {
    /// Wire a chat service over `store` with its events fanned out to
    /// WebSocket subscribers.
    pub fn new(store: Arc<dyn MessageStore>, verify_token: Option<String>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let sink = Arc::new(BroadcastSink::new(events.clone()));
        let chat = Arc::new(ChatService::with_events(store, sink));
        Self {
            chat,
            events,
            verify_token,
        }
    }
}
