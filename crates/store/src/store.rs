//! Persistence trait for the message log.

use async_trait::async_trait;

use crate::{
    Result,
    model::{Conversation, Message, MessageStatus, NewMessage},
};

/// Append-mostly log of canonical message records keyed by external id.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Append a message. Duplicate ids deduplicate: the stored record is
    /// returned along with whether a new row was actually written.
    async fn insert(&self, message: NewMessage) -> Result<(Message, bool)>;

    /// Set `status` (and bump `updated_at_ms`) on an existing message.
    /// Fails with [`crate::Error::NotFound`] when the id is unknown.
    async fn apply_status(&self, message_id: &str, status: MessageStatus) -> Result<Message>;

    /// All messages for one conversation, oldest first (ties break in
    /// insertion order).
    async fn list_by_conversation(&self, conversation_key: &str) -> Result<Vec<Message>>;

    /// One summary row per conversation partner, most recently active first.
    async fn list_conversations(&self) -> Result<Vec<Conversation>>;

    /// Remove a message iff it exists, belongs to `conversation_key`, and is
    /// outgoing. Each rejection surfaces as its own error kind.
    async fn delete(&self, conversation_key: &str, message_id: &str) -> Result<()>;

    /// Drop every stored message. Used by the payload seeding tool.
    async fn clear(&self) -> Result<()>;
}
