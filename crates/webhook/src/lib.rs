//! Provider webhook envelope decoding and normalization.
//!
//! The envelope format is `entry[] → changes[] → value{contacts, messages,
//! statuses}`; [`normalize`] turns one decoded envelope into canonical
//! [`Operation`]s for the message store.

pub mod normalize;
pub mod types;

pub use {
    normalize::{Normalized, Operation, normalize},
    types::WebhookPayload,
};
