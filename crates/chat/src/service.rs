//! The pipeline service: webhook ingestion, reads, sends, deletes.

use std::sync::Arc;

use tracing::{debug, warn};

use {
    chirp_store::{Conversation, Error, Message, MessageStore, Result},
    chirp_webhook::{Operation, WebhookPayload, normalize},
};

use crate::{
    compose::{SendOptions, compose},
    events::{MessageEvent, MessageEventSink},
};

/// Outcome of ingesting one webhook envelope.
#[derive(Debug, Default, serde::Serialize)]
pub struct IngestReport {
    /// Messages newly written to the store (duplicates excluded).
    pub inserted: usize,
    /// Status transitions applied.
    pub updated: usize,
    /// Per-element failures: malformed payload entries and status updates
    /// targeting unknown messages. Never fatal for the rest of the batch.
    pub errors: Vec<String>,
}

/// Request-scoped facade over the message store. One instance is shared by
/// all collaborators; every operation is safe under concurrent invocation.
pub struct ChatService {
    store: Arc<dyn MessageStore>,
    events: Option<Arc<dyn MessageEventSink>>,
}

impl ChatService {
    pub fn new(store: Arc<dyn MessageStore>) -> Self {
        Self {
            store,
            events: None,
        }
    }

    pub fn with_events(store: Arc<dyn MessageStore>, events: Arc<dyn MessageEventSink>) -> Self {
        Self {
            store,
            events: Some(events),
        }
    }

    async fn emit(&self, event: MessageEvent) {
        if let Some(sink) = &self.events {
            sink.emit(event).await;
        }
    }

    /// Normalize an inbound envelope and apply every resulting operation.
    ///
    /// Malformed elements and unknown status targets are collected into the
    /// report; store-level failures abort the batch.
    pub async fn ingest(&self, payload: &WebhookPayload) -> Result<IngestReport> {
        let normalized = normalize(payload);
        let mut report = IngestReport {
            errors: normalized.skipped,
            ..IngestReport::default()
        };

        for operation in normalized.operations {
            match operation {
                Operation::Insert(message) => {
                    let id = message.id.clone();
                    let (stored, inserted) = self.store.insert(message).await?;
                    if inserted {
                        report.inserted += 1;
                        self.emit(MessageEvent::Inserted { message: stored }).await;
                    } else {
                        debug!(id, "duplicate message id, deduplicated");
                    }
                },
                Operation::ApplyStatus { message_id, status } => {
                    match self.store.apply_status(&message_id, status).await {
                        Ok(message) => {
                            report.updated += 1;
                            self.emit(MessageEvent::StatusChanged { message }).await;
                        },
                        Err(Error::NotFound { .. }) => {
                            warn!(message_id, %status, "status update for unknown message");
                            report
                                .errors
                                .push(format!("status update for unknown message {message_id}"));
                        },
                        Err(e) => return Err(e),
                    }
                },
            }
        }

        Ok(report)
    }

    /// One summary row per conversation partner, most recently active first.
    pub async fn list_conversations(&self) -> Result<Vec<Conversation>> {
        self.store.list_conversations().await
    }

    /// All messages for one conversation, oldest first.
    pub async fn list_messages(&self, conversation_key: &str) -> Result<Vec<Message>> {
        self.store.list_by_conversation(conversation_key).await
    }

    /// Compose and persist an outgoing message, returning the stored record.
    pub async fn send_message(
        &self,
        conversation_key: &str,
        body: &str,
        contact_name: Option<&str>,
        options: &SendOptions,
    ) -> Result<Message> {
        let message = compose(conversation_key, body, contact_name, options)?;
        let (stored, inserted) = self.store.insert(message).await?;
        if inserted {
            self.emit(MessageEvent::Inserted {
                message: stored.clone(),
            })
            .await;
        }
        Ok(stored)
    }

    /// Delete an outgoing message after ownership checks.
    pub async fn delete_message(&self, conversation_key: &str, message_id: &str) -> Result<()> {
        self.store.delete(conversation_key, message_id).await?;
        self.emit(MessageEvent::Deleted {
            conversation_key: conversation_key.to_string(),
            message_id: message_id.to_string(),
        })
        .await;
        Ok(())
    }
}
