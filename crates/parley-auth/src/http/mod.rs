//! Axum HTTP handlers for the auth endpoints.
//!
//! The router wires the full external surface:
//!
//! - `GET  /auth/login` - provider redirect URL + state
//! - `GET  /auth/callback` - code exchange, session issuance
//! - `POST /auth/logout` - logout (authenticated)
//! - `POST /auth/refresh` - re-mint the session token (authenticated)
//! - `GET  /auth/me` - current user profile (authenticated)
//! - `POST /auth/permissions/check` - permission decision (authenticated)
//! - `POST /admin/users/{id}/revoke` - account revocation (admin)
//! - `POST /admin/users/{id}/permissions` - create a grant (admin)
//! - `DELETE /admin/users/{id}/permissions/{name}` - end a grant (admin)
//! - `POST /webhook/events` - platform events, HMAC-verified first

use std::sync::Arc;

use axum::{
    Router,
    extract::FromRef,
    middleware,
    routing::{get, post},
};

use crate::audit::AuditSink;
use crate::identity::IdentityStore;
use crate::middleware::AuthState;
use crate::oauth::{CallbackExchanger, LoginRequestBuilder};
use crate::token::SessionTokenService;
use crate::webhook::WebhookSignatureVerifier;

pub mod callback;
pub mod grants;
pub mod login;
pub mod logout;
pub mod permission;
pub mod refresh;
pub mod revoke;
pub mod userinfo;
pub mod webhook;

pub use callback::{CallbackResponse, callback_handler};
pub use grants::{GrantRequest, GrantResponse, add_grant_handler, end_grant_handler};
pub use login::login_handler;
pub use logout::logout_handler;
pub use permission::{PermissionCheckRequest, PermissionCheckResponse, permission_check_handler};
pub use refresh::refresh_handler;
pub use revoke::{RevokeRequest, RevokeResponse, revoke_handler};
pub use userinfo::{UserInfoResponse, userinfo_handler};
pub use webhook::{verify_webhook, webhook_event_handler};

/// Shared state for the auth HTTP surface.
#[derive(Clone)]
pub struct AuthHttpState {
    /// Extractor state (verifier, gate, evaluator, cookie settings).
    pub auth: AuthState,

    /// Authorize-URL builder for the login endpoint.
    pub login: Arc<LoginRequestBuilder>,

    /// Callback exchanger.
    pub exchanger: Arc<CallbackExchanger>,

    /// Token service (for refresh).
    pub tokens: Arc<SessionTokenService>,

    /// Identity store (logout, revoke).
    pub identities: Arc<dyn IdentityStore>,

    /// Audit sink.
    pub audit: Arc<dyn AuditSink>,

    /// Webhook verifier.
    pub webhooks: WebhookSignatureVerifier,

    /// Where the callback redirects on provider errors.
    pub error_redirect: String,
}

impl FromRef<AuthHttpState> for AuthState {
    fn from_ref(state: &AuthHttpState) -> Self {
        state.auth.clone()
    }
}

/// Builds the auth router.
#[must_use]
pub fn router(state: AuthHttpState) -> Router {
    let webhook_routes = Router::new()
        .route("/webhook/events", post(webhook_event_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            verify_webhook,
        ));

    Router::new()
        .route("/auth/login", get(login_handler))
        .route("/auth/callback", get(callback_handler))
        .route("/auth/logout", post(logout_handler))
        .route("/auth/refresh", post(refresh_handler))
        .route("/auth/me", get(userinfo_handler))
        .route("/auth/permissions/check", post(permission_check_handler))
        .route("/admin/users/{id}/revoke", post(revoke_handler))
        .route("/admin/users/{id}/permissions", post(add_grant_handler))
        .route(
            "/admin/users/{id}/permissions/{name}",
            axum::routing::delete(end_grant_handler),
        )
        .merge(webhook_routes)
        .with_state(state)
}
