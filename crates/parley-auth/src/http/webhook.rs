//! Webhook ingress: signature verification before any business logic.

use axum::{
    Json,
    body::{Body, Bytes, to_bytes},
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use serde_json::{Value, json};

use crate::error::AuthError;
use crate::webhook::{SIGNATURE_HEADER, TIMESTAMP_HEADER};

use super::AuthHttpState;

/// Upper bound on webhook payloads; the platform sends far smaller.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Middleware that verifies the platform signature on the raw body.
///
/// The body is read as raw bytes and hashed exactly as received - the
/// request is reassembled from the same bytes afterwards, so handlers
/// downstream still see the payload. Requests missing either header or
/// failing verification are rejected with 401 before any handler runs.
pub async fn verify_webhook(
    State(state): State<AuthHttpState>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let (parts, body) = request.into_parts();

    let bytes = to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| AuthError::signature_verification_failed(format!("Unreadable body: {e}")))?;

    let timestamp = parts
        .headers
        .get(TIMESTAMP_HEADER)
        .and_then(|v| v.to_str().ok());
    let signature = parts
        .headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    state.webhooks.verify(timestamp, signature, &bytes)?;

    let request = Request::from_parts(parts, Body::from(bytes));
    Ok(next.run(request).await)
}

/// `POST /webhook/events`
///
/// Reached only after signature verification. Acknowledges the event;
/// dispatch into the reply engine happens outside this subsystem.
pub async fn webhook_event_handler(body: Bytes) -> Json<Value> {
    let event_type = serde_json::from_slice::<Value>(&body)
        .ok()
        .and_then(|v| v.get("type").and_then(Value::as_str).map(String::from))
        .unwrap_or_else(|| "unknown".to_string());

    tracing::debug!(event_type, "Accepted verified platform event");
    Json(json!({ "ok": true }))
}
