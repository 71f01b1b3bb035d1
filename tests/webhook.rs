//! Webhook adapter integration tests.
//!
//! The axum router is driven directly with `tower::ServiceExt::oneshot`; the
//! Telegram side is an `httpmock` server reached through the API base
//! override, so every outbound call is observable.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use httpmock::{Method::POST, MockServer};
use serde_json::{json, Value};
use tower::ServiceExt as _;

use mdrelay::config::Config;
use mdrelay::telegram::TelegramSender;
use mdrelay::webhook::{router, AppState};

fn unconfigured_state() -> AppState {
    AppState { sender: None }
}

fn state_for(server: &MockServer) -> AppState {
    let config = Config {
        bot_token: Some("123:TESTTOKEN".to_string()),
        api_url: Some(server.base_url().parse().unwrap()),
        send_timeout: Duration::from_secs(10),
        bind_addr: "127.0.0.1:0".parse().unwrap(),
    };
    let sender = TelegramSender::new(&config).unwrap();
    AppState {
        sender: Some(Arc::new(sender)),
    }
}

async fn call(state: AppState, request: Request<Body>) -> (StatusCode, Value) {
    let response = router(state).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn post(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

fn text_update(text: &str) -> String {
    json!({
        "update_id": 700,
        "message": {
            "message_id": 5,
            "date": 1_700_000_000,
            "chat": {"id": 42, "type": "private"},
            "text": text,
        }
    })
    .to_string()
}

/// Canned successful `sendMessage` response.
fn sent_body() -> String {
    json!({
        "ok": true,
        "result": {
            "message_id": 100,
            "date": 1_700_000_000,
            "chat": {"id": 42, "type": "private"},
            "text": "echo",
        }
    })
    .to_string()
}

#[tokio::test]
async fn get_returns_ok_even_without_token() {
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();

    let (status, body) = call(unconfigured_state(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn invalid_json_returns_400() {
    let (status, body) = call(unconfigured_state(), post("{")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "invalid_json"}));
}

#[tokio::test]
async fn update_without_message_is_ignored() {
    let body = json!({"update_id": 1}).to_string();

    let (status, body) = call(unconfigured_state(), post(body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ignored"}));
}

#[tokio::test]
async fn non_update_json_is_ignored() {
    let (status, body) = call(unconfigured_state(), post("[1, 2, 3]")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ignored"}));
}

#[tokio::test]
async fn message_without_text_is_ignored() {
    let body = json!({
        "update_id": 2,
        "message": {
            "message_id": 9,
            "date": 1_700_000_000,
            "chat": {"id": 42, "type": "private"},
            "photo": [{
                "file_id": "abc",
                "file_unique_id": "u1",
                "width": 90,
                "height": 51,
            }],
        }
    })
    .to_string();

    let (status, body) = call(unconfigured_state(), post(body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ignored"}));
}

#[tokio::test]
async fn missing_token_returns_500_without_calling_telegram() {
    let (status, body) = call(unconfigured_state(), post(text_update("hello"))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "missing_token"}));
}

#[tokio::test]
async fn valid_markdown_is_relayed_once() {
    let server = MockServer::start_async().await;
    let send = server
        .mock_async(|when, then| {
            when.method(POST).body_contains("parse_mode");
            then.status(200)
                .header("content-type", "application/json")
                .body(sent_body());
        })
        .await;

    let (status, body) = call(state_for(&server), post(text_update("*bold*"))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "sent"}));
    // Exactly one outbound call, with the render mode set.
    send.assert_async().await;
}

#[tokio::test]
async fn rejected_markup_falls_back_to_plain_text() {
    let server = MockServer::start_async().await;
    let markdown = server
        .mock_async(|when, then| {
            when.method(POST).body_contains("parse_mode");
            then.status(400)
                .header("content-type", "application/json")
                .body(
                    json!({
                        "ok": false,
                        "error_code": 400,
                        "description": "Bad Request: can't parse entities: Can't find end of the entity starting at byte offset 0"
                    })
                    .to_string(),
                );
        })
        .await;
    let fallback = server
        .mock_async(|when, then| {
            when.method(POST).body_contains("couldn't parse");
            then.status(200)
                .header("content-type", "application/json")
                .body(sent_body());
        })
        .await;

    let (status, body) = call(state_for(&server), post(text_update("_broken"))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "parse_error"}));
    // One rendering attempt plus one plain-text apology.
    markdown.assert_async().await;
    fallback.assert_async().await;
}

#[tokio::test]
async fn telegram_failure_returns_internal_error() {
    let server = MockServer::start_async().await;
    let send = server
        .mock_async(|when, then| {
            when.method(POST);
            then.status(502).body("upstream unavailable");
        })
        .await;

    let (status, body) = call(state_for(&server), post(text_update("hello"))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "internal_error"}));
    // No retry on hard failure.
    send.assert_async().await;
}
