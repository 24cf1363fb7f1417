//! Webhook and health route handlers.
//!
//! State is shared via `Arc<BotState>`; nothing in it is mutable.

use axum::{body::Bytes, extract::State, http::HeaderMap, http::StatusCode};
use futures::future::join_all;
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::bot::WeatherBot;
use crate::line::signature::{self, SIGNATURE_HEADER};
use crate::line::webhook::{WebhookEvent, WebhookPayload};
use crate::line::{truncate_reply, ReplySender};

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Shared state accessible by all route handlers.
pub struct BotState {
    pub bot: WeatherBot,
    pub replier: Arc<dyn ReplySender>,
    pub channel_secret: SecretString,
    pub max_reply_chars: usize,
}

pub type AppState = Arc<BotState>;

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// GET /
pub async fn root() -> &'static str {
    "weatherbot is running"
}

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// POST {webhook_path}
///
/// Verifies the signature over the raw body before anything is parsed,
/// then handles every event concurrently and acknowledges once all are
/// done. Reply failures never change the status code.
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, &'static str) {
    let header = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());
    if let Err(e) = signature::verify(state.channel_secret.expose_secret(), &body, header) {
        warn!(error = %e, "Rejected webhook request");
        return (StatusCode::FORBIDDEN, "Forbidden");
    }

    let payload: WebhookPayload = match serde_json::from_slice(&body) {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, "Malformed webhook body");
            return (StatusCode::BAD_REQUEST, "Bad Request");
        }
    };

    let outcomes = join_all(payload.events.iter().map(|event| handle_event(&state, event))).await;
    info!(
        events = payload.events.len(),
        replied = outcomes.iter().filter(|sent| **sent).count(),
        "Webhook processed"
    );

    (StatusCode::OK, "OK")
}

/// Handle one event. Returns whether a reply was sent.
pub async fn handle_event(state: &BotState, event: &WebhookEvent) -> bool {
    let (Some(token), Some(text)) = (event.reply_token(), event.text()) else {
        debug!(kind = %event.kind, "Skipping event without reply token or text");
        return false;
    };

    let Some(reply) = state.bot.reply_for_text(text).await else {
        return false;
    };
    let reply = truncate_reply(&reply, state.max_reply_chars);

    match state.replier.reply(token, &reply).await {
        Ok(()) => true,
        Err(e) => {
            error!(error = %e, "Failed to send reply");
            false
        }
    }
}
