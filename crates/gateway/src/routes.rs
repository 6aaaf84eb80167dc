//! HTTP handlers: thin glue translating between the wire and the pipeline.

use std::collections::HashMap;

use {
    axum::{
        Json,
        extract::{Path, Query, State},
        http::StatusCode,
        response::{IntoResponse, Response},
    },
    serde::Deserialize,
    tracing::warn,
};

use {
    chirp_chat::SendOptions,
    chirp_store::{Error, MessageKind},
    chirp_webhook::WebhookPayload,
};

use crate::state::AppState;

/// Map store errors onto the HTTP surface. Rejected deletes keep their
/// distinct status codes so clients can tell the cases apart.
fn error_response(error: Error) -> Response {
    let status = match &error {
        Error::InvalidInput { .. } => StatusCode::BAD_REQUEST,
        Error::NotFound { .. } | Error::ConversationMismatch { .. } => StatusCode::NOT_FOUND,
        Error::NotDeletable { .. } => StatusCode::FORBIDDEN,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        warn!(%error, "store operation failed");
    }
    (
        status,
        Json(serde_json::json!({ "error": error.to_string() })),
    )
        .into_response()
}

pub async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ── Webhook ──────────────────────────────────────────────────────────────────

/// Provider subscription handshake: echo the challenge when the verify
/// token matches.
fn verify_subscription(
    mode: Option<&str>,
    token: Option<&str>,
    challenge: Option<&str>,
    expected: Option<&str>,
) -> Option<String> {
    let mode = mode?;
    let token = token?;
    let challenge = challenge?;
    let expected = expected?;

    (mode == "subscribe" && token == expected).then(|| challenge.to_string())
}

pub async fn webhook_verify_handler(
    Query(params): Query<HashMap<String, String>>,
    State(state): State<AppState>,
) -> Response {
    match verify_subscription(
        params.get("hub.mode").map(String::as_str),
        params.get("hub.verify_token").map(String::as_str),
        params.get("hub.challenge").map(String::as_str),
        state.verify_token.as_deref(),
    ) {
        Some(challenge) => challenge.into_response(),
        None => (
            StatusCode::FORBIDDEN,
            Json(serde_json::json!({ "error": "verification failed" })),
        )
            .into_response(),
    }
}

pub async fn webhook_post_handler(
    State(state): State<AppState>,
    Json(payload): Json<WebhookPayload>,
) -> Response {
    match state.chat.ingest(&payload).await {
        Ok(report) => Json(report).into_response(),
        Err(e) => error_response(e),
    }
}

// ── Conversations and messages ───────────────────────────────────────────────

pub async fn conversations_handler(State(state): State<AppState>) -> Response {
    match state.chat.list_conversations().await {
        Ok(conversations) => {
            Json(serde_json::json!({ "conversations": conversations })).into_response()
        },
        Err(e) => error_response(e),
    }
}

pub async fn messages_handler(
    Path(conversation_key): Path<String>,
    State(state): State<AppState>,
) -> Response {
    match state.chat.list_messages(&conversation_key).await {
        Ok(messages) => Json(serde_json::json!({ "messages": messages })).into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub text: String,
    pub contact_name: Option<String>,
    pub kind: Option<MessageKind>,
    pub image_data: Option<String>,
}

pub async fn send_handler(
    Path(conversation_key): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<SendMessageRequest>,
) -> Response {
    let options = SendOptions {
        kind: request.kind,
        image_data: request.image_data,
    };
    match state
        .chat
        .send_message(
            &conversation_key,
            &request.text,
            request.contact_name.as_deref(),
            &options,
        )
        .await
    {
        Ok(message) => Json(serde_json::json!({ "message": message })).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn delete_handler(
    Path((conversation_key, message_id)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Response {
    match state.chat.delete_message(&conversation_key, &message_id).await {
        Ok(()) => Json(serde_json::json!({ "deleted": true })).into_response(),
        Err(e) => error_response(e),
    }
}
