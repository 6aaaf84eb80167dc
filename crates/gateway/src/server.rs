use {
    axum::{
        Router,
        routing::{delete, get},
    },
    tower_http::cors::{Any, CorsLayer},
    tracing::info,
};

use crate::{
    routes::{
        conversations_handler, delete_handler, health_handler, messages_handler, send_handler,
        webhook_post_handler, webhook_verify_handler,
    },
    state::AppState,
    ws::ws_upgrade_handler,
};

/// Build the router (shared between production startup and tests).
pub fn build_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/ws", get(ws_upgrade_handler))
        .route(
            "/api/webhook",
            get(webhook_verify_handler).post(webhook_post_handler),
        )
        .route("/api/conversations", get(conversations_handler))
        .route(
            "/api/messages/{conversation_key}",
            get(messages_handler).post(send_handler),
        )
        .route(
            "/api/messages/{conversation_key}/{message_id}",
            delete(delete_handler),
        )
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP + WebSocket server and serve until shutdown.
pub async fn serve(bind: &str, port: u16, state: AppState) -> anyhow::Result<()> {
    let app = build_app(state);
    let addr = format!("{bind}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "gateway listening");
    axum::serve(listener, app).await?;
    Ok(())
}
