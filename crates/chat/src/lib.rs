//! Conversation pipeline: ingest webhook envelopes, compose outbound
//! messages, derive conversation summaries, notify subscribers.

pub mod compose;
pub mod events;
pub mod service;

pub use {
    compose::{SendOptions, compose},
    events::{MessageEvent, MessageEventSink},
    service::{ChatService, IngestReport},
};
