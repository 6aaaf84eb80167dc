#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Integration tests for the HTTP API and WebSocket event fan-out.

use std::{net::SocketAddr, sync::Arc};

use {
    futures::StreamExt,
    tokio::net::TcpListener,
    tokio_tungstenite::connect_async,
};

use {
    chirp_gateway::{AppState, build_app},
    chirp_store::SqliteMessageStore,
};

/// Spin up a test gateway on an ephemeral port, return the bound address.
async fn start_test_server() -> SocketAddr {
    let store = SqliteMessageStore::connect("sqlite::memory:").await.unwrap();
    let state = AppState::new(Arc::new(store), Some("my_token".into()));
    let app = build_app(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn sample_webhook_payload() -> serde_json::Value {
    serde_json::json!({
        "entry": [{
            "changes": [{
                "field": "messages",
                "value": {
                    "contacts": [{ "wa_id": "111", "profile": { "name": "Alice" } }],
                    "messages": [{
                        "id": "m1",
                        "from": "111",
                        "timestamp": "1704067200",
                        "type": "text",
                        "text": { "body": "hi" }
                    }]
                }
            }]
        }]
    })
}

#[tokio::test]
async fn health_endpoint_returns_json() {
    let addr = start_test_server().await;
    let resp = reqwest::get(format!("http://{addr}/health")).await.unwrap();
    assert_eq!(resp.status(), 200);
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn webhook_verification_echoes_challenge() {
    let addr = start_test_server().await;
    let resp = reqwest::get(format!(
        "http://{addr}/api/webhook?hub.mode=subscribe&hub.verify_token=my_token&hub.challenge=c123"
    ))
    .await
    .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "c123");
}

#[tokio::test]
async fn webhook_verification_rejects_bad_token() {
    let addr = start_test_server().await;
    let resp = reqwest::get(format!(
        "http://{addr}/api/webhook?hub.mode=subscribe&hub.verify_token=nope&hub.challenge=c123"
    ))
    .await
    .unwrap();
    assert_eq!(resp.status(), 403);
}

#[tokio::test]
async fn webhook_post_feeds_conversation_listing() {
    let addr = start_test_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("http://{addr}/api/webhook"))
        .json(&sample_webhook_payload())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let report: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(report["inserted"], 1);

    let resp = reqwest::get(format!("http://{addr}/api/conversations"))
        .await
        .unwrap();
    let json: serde_json::Value = resp.json().await.unwrap();
    let conversations = json["conversations"].as_array().unwrap();
    assert_eq!(conversations.len(), 1);
    assert_eq!(conversations[0]["contact_name"], "Alice");
    assert_eq!(conversations[0]["last_message"], "hi");
    assert_eq!(conversations[0]["unread_count"], 1);

    let resp = reqwest::get(format!("http://{addr}/api/messages/111"))
        .await
        .unwrap();
    let json: serde_json::Value = resp.json().await.unwrap();
    let messages = json["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["direction"], "incoming");
    assert_eq!(messages[0]["status"], "received");
}

#[tokio::test]
async fn send_then_delete_round_trip() {
    let addr = start_test_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("http://{addr}/api/messages/111"))
        .json(&serde_json::json!({ "text": "hello", "contact_name": "Alice" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let json: serde_json::Value = resp.json().await.unwrap();
    let id = json["message"]["id"].as_str().unwrap().to_string();
    assert_eq!(json["message"]["status"], "sent");

    let resp = client
        .delete(format!("http://{addr}/api/messages/111/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // Second delete for the same id: gone.
    let resp = client
        .delete(format!("http://{addr}/api/messages/111/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn deleting_incoming_message_is_forbidden() {
    let addr = start_test_server().await;
    let client = reqwest::Client::new();

    client
        .post(format!("http://{addr}/api/webhook"))
        .json(&sample_webhook_payload())
        .send()
        .await
        .unwrap();

    let resp = client
        .delete(format!("http://{addr}/api/messages/111/m1"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
}

#[tokio::test]
async fn image_send_without_data_is_bad_request() {
    let addr = start_test_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("http://{addr}/api/messages/111"))
        .json(&serde_json::json!({ "text": "", "kind": "image" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn ws_clients_receive_inserted_events() {
    let addr = start_test_server().await;
    let (mut ws, _) = connect_async(format!("ws://{addr}/ws"))
        .await
        .expect("ws connect failed");

    let client = reqwest::Client::new();
    client
        .post(format!("http://{addr}/api/webhook"))
        .json(&sample_webhook_payload())
        .send()
        .await
        .unwrap();

    let frame = ws.next().await.unwrap().unwrap();
    let event: serde_json::Value = serde_json::from_str(frame.to_text().unwrap()).unwrap();
    assert_eq!(event["kind"], "inserted");
    assert_eq!(event["message"]["id"], "m1");
    assert_eq!(event["message"]["conversation_key"], "111");
}
