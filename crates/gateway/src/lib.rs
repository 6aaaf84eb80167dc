//! Thin HTTP/WebSocket surface over the conversation pipeline.
//!
//! Routes mirror the provider-facing webhook plus the conversation UI's
//! read/send/delete calls; all real work happens in `chirp-chat`.

pub mod routes;
pub mod server;
pub mod state;
pub mod ws;

pub use {
    server::{build_app, serve},
    state::AppState,
    ws::BroadcastSink,
};
