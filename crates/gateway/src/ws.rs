//! WebSocket fan-out of pipeline events to connected clients.

use {
    async_trait::async_trait,
    axum::{
        extract::{
            State, WebSocketUpgrade,
            ws::{Message as WsMessage, WebSocket},
        },
        response::IntoResponse,
    },
    tokio::sync::broadcast,
    tracing::{debug, warn},
};

use chirp_chat::{MessageEvent, MessageEventSink};

use crate::state::AppState;

/// Bridges the pipeline's event sink onto the broadcast channel the
/// WebSocket handlers subscribe to.
pub struct BroadcastSink {
    tx: broadcast::Sender<MessageEvent>,
}

impl BroadcastSink {
    pub fn new(tx: broadcast::Sender<MessageEvent>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl MessageEventSink for BroadcastSink {
    async fn emit(&self, event: MessageEvent) {
        // Send only fails when no client is subscribed; fan-out is best
        // effort and never blocks the pipeline.
        let _ = self.tx.send(event);
    }
}

pub async fn ws_upgrade_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_connection(socket, state))
}

/// Forward every pipeline event to the client as a JSON frame until either
/// side disconnects. Client frames are ignored; the socket is notify-only.
async fn handle_connection(mut socket: WebSocket, state: AppState) {
    let mut events = state.events.subscribe();
    debug!("ws client connected");

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    let json = match serde_json::to_string(&event) {
                        Ok(json) => json,
                        Err(e) => {
                            warn!("failed to serialize message event: {e}");
                            continue;
                        },
                    };
                    if socket.send(WsMessage::Text(json.into())).await.is_err() {
                        break;
                    }
                },
                Err(broadcast::error::RecvError::Lagged(dropped)) => {
                    warn!(dropped, "ws client lagged, events dropped");
                },
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(_)) => {},
                _ => break,
            },
        }
    }

    debug!("ws client disconnected");
}
