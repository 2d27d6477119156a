//! Session refresh endpoint.

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, HeaderValue, header},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::audit::{AuthAction, AuthEvent, record_event};
use crate::error::AuthError;
use crate::middleware::SessionAuth;

use super::AuthHttpState;

/// `POST /auth/refresh`
///
/// Re-mints the session token for the authenticated user. The
/// `SessionAuth` extractor has already re-run the revocation gate, so a
/// revoked account can never refresh its way back in.
pub async fn refresh_handler(
    State(state): State<AuthHttpState>,
    SessionAuth(context): SessionAuth,
) -> Result<Response, AuthError> {
    let issued = state.tokens.issue(&context.user)?;

    record_event(
        state.audit.as_ref(),
        AuthEvent::success(AuthAction::Refresh, context.user_id()),
    )
    .await;

    let mut headers = HeaderMap::new();
    let max_age = u64::try_from(state.tokens.lifetime_secs()).unwrap_or(0);
    if let Some(cookie) = state.auth.cookie.build_cookie(&issued.token, max_age)
        && let Ok(value) = HeaderValue::from_str(&cookie)
    {
        headers.insert(header::SET_COOKIE, value);
    }

    Ok((
        headers,
        Json(json!({
            "sessionToken": issued.token,
            "expiresAt": issued.claims.exp,
        })),
    )
        .into_response())
}
