use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use teloxide::types::Update;
use tracing::{error, warn};

use crate::relay::{self, Outcome};
use crate::telegram::TelegramSender;

/// Shared webhook state. `sender` is `None` when the process came up without
/// a credential; relay attempts then answer `missing_token` while the health
/// check keeps working.
#[derive(Clone)]
pub struct AppState {
    pub sender: Option<Arc<TelegramSender>>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health).post(receive_update))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

async fn receive_update(State(state): State<AppState>, body: Bytes) -> (StatusCode, Json<Value>) {
    // Reject payloads that are not even valid JSON before looking for an update.
    if let Err(err) = serde_json::from_slice::<Value>(&body) {
        warn!("Received invalid JSON payload: {err}");
        return reply_error(StatusCode::BAD_REQUEST, "invalid_json");
    }

    // Valid JSON that is not a Telegram update carries no message either way.
    // teloxide's flattened `Update` does not round-trip through
    // `serde_json::Value`, so deserialize straight from the request bytes.
    let update = match serde_json::from_slice::<Update>(&body) {
        Ok(update) => update,
        Err(_) => return reply_status(Outcome::Ignored),
    };

    let Some(message) = relay::extract_message(&update) else {
        return reply_status(Outcome::Ignored);
    };
    let Some((chat_id, text, message_id)) = relay::reply_target(message) else {
        return reply_status(Outcome::Ignored);
    };

    // The credential check sits at dispatch time: updates with nothing to
    // relay are ignored even on an unconfigured server.
    let Some(sender) = &state.sender else {
        error!("No bot token configured; dropping update {:?}", update.id);
        return reply_error(StatusCode::INTERNAL_SERVER_ERROR, "missing_token");
    };

    match relay::respond(sender.as_ref(), chat_id, text, Some(message_id)).await {
        Ok(outcome) => reply_status(outcome),
        Err(err) => {
            error!("Failed to relay update {:?}: {err}", update.id);
            reply_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
        }
    }
}

fn reply_status(outcome: Outcome) -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({"status": outcome.as_status()})))
}

fn reply_error(code: StatusCode, label: &str) -> (StatusCode, Json<Value>) {
    (code, Json(json!({"error": label})))
}
