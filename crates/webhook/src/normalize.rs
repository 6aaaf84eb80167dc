//! Event Normalizer: raw envelopes → canonical store operations.

use std::collections::HashMap;

use tracing::{debug, warn};

use chirp_store::{Direction, MediaAttachment, MessageKind, MessageStatus, NewMessage};

use crate::types::{ChangeValue, RawMessage, RawStatus, WebhookPayload};

/// A single normalized domain operation, ready for the message store.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Insert(NewMessage),
    ApplyStatus {
        message_id: String,
        status: MessageStatus,
    },
}

/// Result of normalizing one envelope. `skipped` carries the reason each
/// dropped element was rejected; skips are reported, never raised.
#[derive(Debug, Default)]
pub struct Normalized {
    pub operations: Vec<Operation>,
    pub skipped: Vec<String>,
}

/// What one change value carries, decided up front so the handlers below
/// never sniff optional fields mid-flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnvelopeKind {
    Empty,
    Messages,
    Statuses,
    MessagesAndStatuses,
}

fn classify(value: &ChangeValue) -> EnvelopeKind {
    match (value.messages.is_empty(), value.statuses.is_empty()) {
        (true, true) => EnvelopeKind::Empty,
        (false, true) => EnvelopeKind::Messages,
        (true, false) => EnvelopeKind::Statuses,
        (false, false) => EnvelopeKind::MessagesAndStatuses,
    }
}

/// Normalize an envelope into zero-or-more operations, in payload order.
///
/// Every `entry`/`changes` element is consulted. Absent sections contribute
/// no operations; a malformed individual element is skipped with a reason
/// while the rest of the batch continues.
pub fn normalize(payload: &WebhookPayload) -> Normalized {
    let mut out = Normalized::default();
    for entry in &payload.entry {
        for change in &entry.changes {
            let value = &change.value;
            match classify(value) {
                EnvelopeKind::Empty => {
                    debug!(field = %change.field, "change carries no messages or statuses");
                },
                EnvelopeKind::Messages => normalize_messages(value, &mut out),
                EnvelopeKind::Statuses => normalize_statuses(&value.statuses, &mut out),
                EnvelopeKind::MessagesAndStatuses => {
                    normalize_messages(value, &mut out);
                    normalize_statuses(&value.statuses, &mut out);
                },
            }
        }
    }
    out
}

fn normalize_messages(value: &ChangeValue, out: &mut Normalized) {
    // Contact display names, looked up by the message's sender id.
    let contacts: HashMap<&str, &str> = value
        .contacts
        .iter()
        .filter_map(|c| {
            let wa_id = c.wa_id.as_deref()?;
            let name = c.profile.as_ref()?.name.as_deref()?;
            Some((wa_id, name))
        })
        .collect();

    for (index, message) in value.messages.iter().enumerate() {
        match normalize_message(message, &contacts) {
            Ok(op) => out.operations.push(op),
            Err(reason) => {
                warn!(index, %reason, "skipping malformed message");
                out.skipped.push(format!("messages[{index}]: {reason}"));
            },
        }
    }
}

fn normalize_message(
    message: &RawMessage,
    contacts: &HashMap<&str, &str>,
) -> Result<Operation, String> {
    let id = message.id.clone().ok_or("missing id")?;
    let from = message.from.clone().ok_or("missing from")?;
    let timestamp = message.timestamp.ok_or("missing or invalid timestamp")?;

    let kind = MessageKind::from(message.message_type.as_deref().unwrap_or("text"));

    let media = match kind {
        MessageKind::Image => message
            .image
            .as_ref()
            .map(|m| MediaAttachment::image(m.mime_type.clone(), m.caption.clone())),
        MessageKind::Document => message
            .document
            .as_ref()
            .map(|m| MediaAttachment::document(m.mime_type.clone(), m.filename.clone())),
        _ => None,
    };

    let contact_name = contacts
        .get(from.as_str())
        .map(|name| (*name).to_string())
        .unwrap_or_else(|| format!("User {from}"));

    Ok(Operation::Insert(NewMessage {
        id,
        conversation_key: from,
        direction: Direction::Incoming,
        kind,
        body: message.text_body(),
        media,
        contact_name,
        status: MessageStatus::Received,
        timestamp_ms: timestamp * 1000,
    }))
}

fn normalize_statuses(statuses: &[RawStatus], out: &mut Normalized) {
    for (index, status) in statuses.iter().enumerate() {
        match normalize_status(status) {
            Ok(op) => out.operations.push(op),
            Err(reason) => {
                warn!(index, %reason, "skipping malformed status");
                out.skipped.push(format!("statuses[{index}]: {reason}"));
            },
        }
    }
}

fn normalize_status(status: &RawStatus) -> Result<Operation, String> {
    let message_id = status.id.clone().ok_or("missing id")?;
    let raw = status.status.as_deref().ok_or("missing status")?;
    let status = raw
        .parse::<MessageStatus>()
        .map_err(|e| e.to_string())?;
    Ok(Operation::ApplyStatus { message_id, status })
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn payload(value: serde_json::Value) -> WebhookPayload {
        serde_json::from_value(serde_json::json!({
            "entry": [{ "changes": [{ "field": "messages", "value": value }] }]
        }))
        .unwrap()
    }

    fn text_message(id: &str, from: &str, timestamp: &str, body: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "from": from,
            "timestamp": timestamp,
            "type": "text",
            "text": { "body": body }
        })
    }

    #[test]
    fn message_with_contact_normalizes_fully() {
        let normalized = normalize(&payload(serde_json::json!({
            "contacts": [{ "wa_id": "111", "profile": { "name": "Alice" } }],
            "messages": [text_message("m1", "111", "1704067200", "hi")]
        })));

        assert!(normalized.skipped.is_empty());
        assert_eq!(normalized.operations.len(), 1);
        let Operation::Insert(message) = &normalized.operations[0] else {
            panic!("expected insert");
        };
        assert_eq!(message.id, "m1");
        assert_eq!(message.conversation_key, "111");
        assert_eq!(message.contact_name, "Alice");
        assert_eq!(message.direction, Direction::Incoming);
        assert_eq!(message.status, MessageStatus::Received);
        assert_eq!(message.kind, MessageKind::Text);
        assert_eq!(message.body, "hi");
        assert_eq!(message.timestamp_ms, 1_704_067_200_000);
    }

    #[test]
    fn missing_contact_synthesizes_display_name() {
        let normalized = normalize(&payload(serde_json::json!({
            "messages": [text_message("m1", "555", "1704067200", "yo")]
        })));

        let Operation::Insert(message) = &normalized.operations[0] else {
            panic!("expected insert");
        };
        assert_eq!(message.contact_name, "User 555");
    }

    #[test]
    fn emits_inserts_and_statuses_in_payload_order() {
        let normalized = normalize(&payload(serde_json::json!({
            "messages": [
                text_message("m1", "111", "1", "a"),
                text_message("m2", "111", "2", "b"),
            ],
            "statuses": [{ "id": "m1", "status": "delivered", "timestamp": "3" }]
        })));

        assert_eq!(normalized.operations.len(), 3);
        assert!(matches!(&normalized.operations[0], Operation::Insert(m) if m.id == "m1"));
        assert!(matches!(&normalized.operations[1], Operation::Insert(m) if m.id == "m2"));
        assert!(matches!(
            &normalized.operations[2],
            Operation::ApplyStatus { message_id, status }
                if message_id == "m1" && *status == MessageStatus::Delivered
        ));
    }

    #[test]
    fn empty_envelope_yields_no_operations() {
        let normalized = normalize(&WebhookPayload::default());
        assert!(normalized.operations.is_empty());
        assert!(normalized.skipped.is_empty());

        let normalized = normalize(&payload(serde_json::json!({ "metadata": {} })));
        assert!(normalized.operations.is_empty());
        assert!(normalized.skipped.is_empty());
    }

    #[test]
    fn malformed_message_skips_only_itself() {
        let normalized = normalize(&payload(serde_json::json!({
            "messages": [
                { "id": "broken", "from": "111" },
                text_message("m2", "111", "2", "fine"),
            ]
        })));

        assert_eq!(normalized.operations.len(), 1);
        assert!(matches!(&normalized.operations[0], Operation::Insert(m) if m.id == "m2"));
        assert_eq!(normalized.skipped.len(), 1);
        assert!(normalized.skipped[0].contains("timestamp"));
    }

    #[test]
    fn image_message_populates_media_with_empty_caption_default() {
        let normalized = normalize(&payload(serde_json::json!({
            "messages": [{
                "id": "m1",
                "from": "111",
                "timestamp": "10",
                "type": "image",
                "image": { "mime_type": "image/jpeg" }
            }]
        })));

        let Operation::Insert(message) = &normalized.operations[0] else {
            panic!("expected insert");
        };
        assert_eq!(message.kind, MessageKind::Image);
        assert_eq!(message.body, "");
        let media = message.media.as_ref().unwrap();
        assert_eq!(media.mime_type.as_deref(), Some("image/jpeg"));
        assert_eq!(media.caption.as_deref(), Some(""));
    }

    #[test]
    fn document_message_defaults_filename() {
        let normalized = normalize(&payload(serde_json::json!({
            "messages": [{
                "id": "m1",
                "from": "111",
                "timestamp": "10",
                "type": "document",
                "document": { "mime_type": "application/pdf" }
            }]
        })));

        let Operation::Insert(message) = &normalized.operations[0] else {
            panic!("expected insert");
        };
        let media = message.media.as_ref().unwrap();
        assert_eq!(media.filename.as_deref(), Some("Document"));
    }

    #[test]
    fn unknown_message_type_is_preserved() {
        let normalized = normalize(&payload(serde_json::json!({
            "messages": [{
                "id": "m1",
                "from": "111",
                "timestamp": "10",
                "type": "sticker"
            }]
        })));

        let Operation::Insert(message) = &normalized.operations[0] else {
            panic!("expected insert");
        };
        assert_eq!(message.kind, MessageKind::Other("sticker".into()));
        assert!(message.media.is_none());
    }

    #[test]
    fn unknown_status_string_is_skipped_with_reason() {
        let normalized = normalize(&payload(serde_json::json!({
            "statuses": [
                { "id": "m1", "status": "teleported" },
                { "id": "m2", "status": "read" },
            ]
        })));

        assert_eq!(normalized.operations.len(), 1);
        assert_eq!(normalized.skipped.len(), 1);
        assert!(normalized.skipped[0].contains("teleported"));
    }

    #[test]
    fn every_entry_and_change_is_consulted() {
        let normalized = normalize(
            &serde_json::from_value::<WebhookPayload>(serde_json::json!({
                "entry": [
                    { "changes": [{ "value": { "messages": [text_message("m1", "111", "1", "a")] } }] },
                    { "changes": [
                        { "value": { "messages": [text_message("m2", "222", "2", "b")] } },
                        { "value": { "statuses": [{ "id": "m1", "status": "read" }] } }
                    ] }
                ]
            }))
            .unwrap(),
        );

        assert_eq!(normalized.operations.len(), 3);
    }

    #[test]
    fn numeric_timestamps_are_accepted() {
        let normalized = normalize(&payload(serde_json::json!({
            "messages": [{
                "id": "m1",
                "from": "111",
                "timestamp": 42,
                "type": "text",
                "text": { "body": "hi" }
            }]
        })));

        let Operation::Insert(message) = &normalized.operations[0] else {
            panic!("expected insert");
        };
        assert_eq!(message.timestamp_ms, 42_000);
    }
}
