//! Wire types for the provider's webhook envelope.
//!
//! Every section is optional on the wire; decoding is lenient so a partial
//! envelope still parses and simply contributes fewer operations.

use serde::{Deserialize, Deserializer};

/// Top-level webhook envelope: `entry[] → changes[] → value`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub entry: Vec<Entry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Entry {
    #[serde(default)]
    pub changes: Vec<Change>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Change {
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub value: ChangeValue,
}

/// The interesting part of a change: contact snapshots plus either new
/// messages, status transitions, or neither.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChangeValue {
    pub metadata: Option<Metadata>,
    #[serde(default)]
    pub contacts: Vec<Contact>,
    #[serde(default)]
    pub messages: Vec<RawMessage>,
    #[serde(default)]
    pub statuses: Vec<RawStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Metadata {
    pub display_phone_number: Option<String>,
    pub phone_number_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Contact {
    pub wa_id: Option<String>,
    pub profile: Option<ContactProfile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContactProfile {
    pub name: Option<String>,
}

/// One inbound message as the provider sends it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMessage {
    pub id: Option<String>,
    pub from: Option<String>,
    #[serde(default, deserialize_with = "de_epoch_seconds")]
    pub timestamp: Option<i64>,
    #[serde(rename = "type")]
    pub message_type: Option<String>,
    pub text: Option<TextBody>,
    pub image: Option<MediaObject>,
    pub document: Option<MediaObject>,
}

impl RawMessage {
    /// Plain text body; empty for media-only messages.
    pub fn text_body(&self) -> String {
        self.text
            .as_ref()
            .map(|t| t.body.clone())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TextBody {
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaObject {
    pub mime_type: Option<String>,
    pub caption: Option<String>,
    pub filename: Option<String>,
}

/// A status transition for a previously delivered message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawStatus {
    pub id: Option<String>,
    pub status: Option<String>,
    /// Informational only; never overwrites the message's own timestamp.
    #[serde(default, deserialize_with = "de_epoch_seconds")]
    pub timestamp: Option<i64>,
    pub recipient_id: Option<String>,
}

/// The provider sends epoch-seconds timestamps as strings; accept numbers
/// too. Unparseable values decode to `None` and the element is skipped
/// downstream rather than failing the whole envelope.
fn de_epoch_seconds<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Str(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        None => None,
        Some(Raw::Int(seconds)) => Some(seconds),
        Some(Raw::Str(s)) => s.trim().parse().ok(),
    })
}
