//! Outbound Composer: canonical records for locally authored messages.

use uuid::Uuid;

use chirp_store::{
    Direction, Error, MediaAttachment, MessageKind, MessageStatus, NewMessage, Result, now_ms,
};

/// Options for an outbound send. Defaults to a plain text message.
#[derive(Debug, Clone, Default)]
pub struct SendOptions {
    pub kind: Option<MessageKind>,
    /// Inline data URL, required for image messages.
    pub image_data: Option<String>,
}

/// Build a store-ready outgoing message.
///
/// Text messages require a non-empty (trimmed) body; image messages may have
/// an empty body but must carry inline image data. Validation failures never
/// reach the store.
pub fn compose(
    conversation_key: &str,
    body: &str,
    contact_name: Option<&str>,
    options: &SendOptions,
) -> Result<NewMessage> {
    let kind = options.kind.clone().unwrap_or(MessageKind::Text);
    let body = body.trim();

    let media = match kind {
        MessageKind::Image => {
            let data = options
                .image_data
                .clone()
                .ok_or_else(|| Error::invalid_input("image messages require inline image data"))?;
            Some(MediaAttachment::inline_image(data))
        },
        _ => {
            if body.is_empty() {
                return Err(Error::invalid_input("message text must not be empty"));
            }
            None
        },
    };

    let contact_name = contact_name
        .filter(|name| !name.trim().is_empty())
        .map(ToString::to_string)
        .unwrap_or_else(|| format!("User {conversation_key}"));

    Ok(NewMessage {
        id: format!("msg_{}", Uuid::new_v4().simple()),
        conversation_key: conversation_key.to_string(),
        direction: Direction::Outgoing,
        kind,
        body: body.to_string(),
        media,
        contact_name,
        status: MessageStatus::Sent,
        timestamp_ms: now_ms(),
    })
}
