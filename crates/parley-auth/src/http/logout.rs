//! Logout endpoint.

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, HeaderValue, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use time::OffsetDateTime;

use crate::audit::{AuthAction, AuthEvent, record_event};
use crate::error::AuthError;
use crate::middleware::SessionAuth;

use super::AuthHttpState;

/// `POST /auth/logout`
///
/// Records the logout, emits the audit event, and clears the session
/// cookie. The stateless token itself stays valid until `exp`; callers
/// that need immediate invalidation revoke the account instead.
pub async fn logout_handler(
    State(state): State<AuthHttpState>,
    SessionAuth(context): SessionAuth,
) -> Result<Response, AuthError> {
    state
        .identities
        .record_logout(context.user_id(), OffsetDateTime::now_utc())
        .await?;

    record_event(
        state.audit.as_ref(),
        AuthEvent::success(AuthAction::Logout, context.user_id()),
    )
    .await;

    let mut headers = HeaderMap::new();
    if let Some(cookie) = state.auth.cookie.clear_cookie()
        && let Ok(value) = HeaderValue::from_str(&cookie)
    {
        headers.insert(header::SET_COOKIE, value);
    }

    Ok((headers, Json(json!({ "loggedOut": true }))).into_response())
}
