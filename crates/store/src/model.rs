//! Canonical message records, independent of the originating payload shape.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Who authored a message relative to this account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Incoming,
    Outgoing,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Incoming => "incoming",
            Self::Outgoing => "outgoing",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "incoming" => Ok(Self::Incoming),
            "outgoing" => Ok(Self::Outgoing),
            other => Err(Error::invalid_input(format!("unknown direction: {other}"))),
        }
    }
}

/// Delivery state of a message. Mutable only through a status-apply operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Received,
    Sent,
    Delivered,
    Read,
}

impl MessageStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Sent => "sent",
            Self::Delivered => "delivered",
            Self::Read => "read",
        }
    }
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MessageStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "received" => Ok(Self::Received),
            "sent" => Ok(Self::Sent),
            "delivered" => Ok(Self::Delivered),
            "read" => Ok(Self::Read),
            other => Err(Error::invalid_input(format!("unknown status: {other}"))),
        }
    }
}

/// Content kind. Open-ended: provider payloads may carry kinds we do not
/// model explicitly, which round-trip as [`MessageKind::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    Image,
    Document,
    #[serde(untagged)]
    Other(String),
}

impl MessageKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Document => "document",
            Self::Other(kind) => kind,
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for MessageKind {
    fn from(s: &str) -> Self {
        match s {
            "text" => Self::Text,
            "image" => Self::Image,
            "document" => Self::Document,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Attachment kind carried alongside non-text messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Document,
}

/// Attachment descriptor for non-text messages.
///
/// Inbound media carries the provider's mime type plus a caption (images) or
/// filename (documents). Locally composed images carry the inline `data` URL
/// instead, so the UI collaborator can render them without a media fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaAttachment {
    pub kind: MediaKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl MediaAttachment {
    /// Inbound image descriptor. Caption defaults to empty.
    #[must_use]
    pub fn image(mime_type: Option<String>, caption: Option<String>) -> Self {
        Self {
            kind: MediaKind::Image,
            mime_type,
            caption: Some(caption.unwrap_or_default()),
            filename: None,
            data: None,
        }
    }

    /// Inbound document descriptor. Filename defaults to "Document".
    #[must_use]
    pub fn document(mime_type: Option<String>, filename: Option<String>) -> Self {
        Self {
            kind: MediaKind::Document,
            mime_type,
            caption: None,
            filename: Some(filename.unwrap_or_else(|| "Document".to_string())),
            data: None,
        }
    }

    /// Locally composed image with inline data URL.
    #[must_use]
    pub fn inline_image(data: String) -> Self {
        Self {
            kind: MediaKind::Image,
            mime_type: None,
            caption: None,
            filename: None,
            data: Some(data),
        }
    }
}

/// A stored message record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// External id: the provider's message id, or a generated `msg_…` id for
    /// outgoing messages. Sole lookup key for status updates and deletes.
    pub id: String,
    /// Counterpart identifier grouping messages into one conversation.
    pub conversation_key: String,
    pub direction: Direction,
    pub kind: MessageKind,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<MediaAttachment>,
    /// Counterpart display name, snapshot at time of receipt.
    pub contact_name: String,
    pub status: MessageStatus,
    /// Event time in epoch milliseconds.
    pub timestamp_ms: i64,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

/// Input to [`crate::MessageStore::insert`]; the store stamps
/// `created_at_ms`/`updated_at_ms` itself.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMessage {
    pub id: String,
    pub conversation_key: String,
    pub direction: Direction,
    pub kind: MessageKind,
    pub body: String,
    pub media: Option<MediaAttachment>,
    pub contact_name: String,
    pub status: MessageStatus,
    pub timestamp_ms: i64,
}

/// One row per conversation partner, derived from the message log.
#[derive(Debug, Clone, Serialize)]
pub struct Conversation {
    pub conversation_key: String,
    pub contact_name: String,
    pub last_message: String,
    pub last_message_time_ms: i64,
    pub unread_count: i64,
}

/// Current time in epoch milliseconds.
pub fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_known_and_unknown() {
        assert_eq!(MessageKind::from("text"), MessageKind::Text);
        assert_eq!(MessageKind::from("image"), MessageKind::Image);
        assert_eq!(
            MessageKind::from("sticker"),
            MessageKind::Other("sticker".into())
        );
        assert_eq!(MessageKind::Other("sticker".into()).as_str(), "sticker");
    }

    #[test]
    fn kind_serde_uses_lowercase_and_falls_back() {
        let json = serde_json::to_value(MessageKind::Document).unwrap();
        assert_eq!(json, "document");
        let parsed: MessageKind = serde_json::from_value(serde_json::json!("audio")).unwrap();
        assert_eq!(parsed, MessageKind::Other("audio".into()));
    }

    #[test]
    fn status_parses_all_variants() {
        for s in ["received", "sent", "delivered", "read"] {
            assert_eq!(s.parse::<MessageStatus>().unwrap().as_str(), s);
        }
        assert!("failed".parse::<MessageStatus>().is_err());
    }

    #[test]
    fn media_defaults_match_payload_rules() {
        let image = MediaAttachment::image(Some("image/jpeg".into()), None);
        assert_eq!(image.caption.as_deref(), Some(""));
        let doc = MediaAttachment::document(Some("application/pdf".into()), None);
        assert_eq!(doc.filename.as_deref(), Some("Document"));
    }
}
