//! Replay webhook payload files through the ingest pipeline.

use std::{path::Path, sync::Arc};

use {
    anyhow::Context,
    tracing::{info, warn},
};

use {chirp_chat::ChatService, chirp_store::MessageStore, chirp_webhook::WebhookPayload};

/// Clear the store, replay every payload, print a summary.
pub async fn run(store: Arc<dyn MessageStore>, dir: Option<&Path>) -> anyhow::Result<()> {
    let chat = ChatService::new(Arc::clone(&store));

    store.clear().await?;
    info!("cleared existing messages");

    let payloads = match dir {
        Some(dir) => load_payload_files(dir)?,
        None => {
            info!("no payload directory given, seeding built-in samples");
            sample_payloads()?
        },
    };

    let total = payloads.len();
    for (name, payload) in payloads {
        let report = chat.ingest(&payload).await?;
        if report.errors.is_empty() {
            info!(
                name,
                inserted = report.inserted,
                updated = report.updated,
                "payload processed"
            );
        } else {
            warn!(name, errors = ?report.errors, "payload processed with errors");
        }
    }

    let conversations = chat.list_conversations().await?;
    let mut messages = 0usize;
    for conversation in &conversations {
        messages += chat
            .list_messages(&conversation.conversation_key)
            .await?
            .len();
    }
    info!(
        payloads = total,
        conversations = conversations.len(),
        messages,
        "seed complete"
    );
    Ok(())
}

fn load_payload_files(dir: &Path) -> anyhow::Result<Vec<(String, WebhookPayload)>> {
    let mut paths: Vec<_> = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read payload directory {}", dir.display()))?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    let mut payloads = Vec::with_capacity(paths.len());
    for path in paths {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let payload = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        payloads.push((name, payload));
    }
    Ok(payloads)
}

/// Two demo conversations plus one status transition, mirroring what the
/// provider would deliver over a short exchange.
fn sample_payloads() -> anyhow::Result<Vec<(String, WebhookPayload)>> {
    let samples = [
        (
            "john-hello",
            serde_json::json!({
                "entry": [{
                    "changes": [{
                        "field": "messages",
                        "value": {
                            "contacts": [{ "profile": { "name": "John Smith" }, "wa_id": "919876543210" }],
                            "messages": [{
                                "from": "919876543210",
                                "id": "wamid.sample.john.1",
                                "timestamp": "1704067200",
                                "text": { "body": "Hello! How are you doing?" },
                                "type": "text"
                            }]
                        }
                    }]
                }]
            }),
        ),
        (
            "sarah-hello",
            serde_json::json!({
                "entry": [{
                    "changes": [{
                        "field": "messages",
                        "value": {
                            "contacts": [{ "profile": { "name": "Sarah Johnson" }, "wa_id": "919876543211" }],
                            "messages": [{
                                "from": "919876543211",
                                "id": "wamid.sample.sarah.1",
                                "timestamp": "1704067800",
                                "text": { "body": "Hi there! Do you have time for a quick call?" },
                                "type": "text"
                            }]
                        }
                    }]
                }]
            }),
        ),
        (
            "john-delivered",
            serde_json::json!({
                "entry": [{
                    "changes": [{
                        "field": "messages",
                        "value": {
                            "statuses": [{
                                "id": "wamid.sample.john.1",
                                "status": "delivered",
                                "timestamp": "1704067300",
                                "recipient_id": "919876543210"
                            }]
                        }
                    }]
                }]
            }),
        ),
        (
            "john-followup",
            serde_json::json!({
                "entry": [{
                    "changes": [{
                        "field": "messages",
                        "value": {
                            "contacts": [{ "profile": { "name": "John Smith" }, "wa_id": "919876543210" }],
                            "messages": [{
                                "from": "919876543210",
                                "id": "wamid.sample.john.2",
                                "timestamp": "1704070800",
                                "text": { "body": "Are we still meeting today at 3 PM?" },
                                "type": "text"
                            }]
                        }
                    }]
                }]
            }),
        ),
        (
            "sarah-followup",
            serde_json::json!({
                "entry": [{
                    "changes": [{
                        "field": "messages",
                        "value": {
                            "contacts": [{ "profile": { "name": "Sarah Johnson" }, "wa_id": "919876543211" }],
                            "messages": [{
                                "from": "919876543211",
                                "id": "wamid.sample.sarah.2",
                                "timestamp": "1704071400",
                                "text": { "body": "Thanks for the quick response! I'll call you in 5 minutes." },
                                "type": "text"
                            }]
                        }
                    }]
                }]
            }),
        ),
    ];

    samples
        .into_iter()
        .map(|(name, value)| Ok((name.to_string(), serde_json::from_value(value)?)))
        .collect()
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use chirp_store::SqliteMessageStore;

    use super::*;

    #[tokio::test]
    async fn built_in_samples_populate_the_store() {
        let store: Arc<dyn MessageStore> =
            Arc::new(SqliteMessageStore::connect("sqlite::memory:").await.unwrap());
        run(Arc::clone(&store), None).await.unwrap();

        let chat = ChatService::new(Arc::clone(&store));
        let conversations = chat.list_conversations().await.unwrap();
        assert_eq!(conversations.len(), 2);
        // Sarah's follow-up is the most recent message overall.
        assert_eq!(conversations[0].contact_name, "Sarah Johnson");
        assert_eq!(conversations[0].unread_count, 2);

        let john = chat.list_messages("919876543210").await.unwrap();
        assert_eq!(john.len(), 2);
        assert_eq!(john[0].status, chirp_store::MessageStatus::Delivered);
    }

    #[tokio::test]
    async fn seeding_twice_resets_rather_than_duplicates() {
        let store: Arc<dyn MessageStore> =
            Arc::new(SqliteMessageStore::connect("sqlite::memory:").await.unwrap());
        run(Arc::clone(&store), None).await.unwrap();
        run(Arc::clone(&store), None).await.unwrap();

        let chat = ChatService::new(store);
        assert_eq!(chat.list_conversations().await.unwrap().len(), 2);
    }
}
