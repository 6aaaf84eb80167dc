//! Change notifications emitted by the pipeline after each committed write.

use async_trait::async_trait;

use chirp_store::Message;

/// Emitted once the corresponding record is fully persisted, so subscribers
/// always observe an immediately-consistent store.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MessageEvent {
    Inserted {
        message: Message,
    },
    StatusChanged {
        message: Message,
    },
    Deleted {
        conversation_key: String,
        message_id: String,
    },
}

/// Sink for message events — the transport layer provides the concrete
/// implementation and owns the fan-out to connected clients.
#[async_trait]
pub trait MessageEventSink: Send + Sync {
    async fn emit(&self, event: MessageEvent);
}
