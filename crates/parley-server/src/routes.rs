//! Router assembly.

use axum::{Json, Router, routing::get};
use serde_json::json;
use tower_http::trace::TraceLayer;

use parley_auth::http::AuthHttpState;

/// Builds the complete application router.
#[must_use]
pub fn app(auth_state: AuthHttpState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .merge(parley_auth::http::router(auth_state))
        .layer(TraceLayer::new_for_http())
}

/// `GET /health` - liveness only, unauthenticated.
async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
