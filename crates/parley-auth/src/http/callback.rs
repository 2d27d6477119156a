//! OAuth callback endpoint.

use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, header},
    response::{IntoResponse, Redirect, Response},
};
use serde::Serialize;

use crate::error::AuthError;
use crate::oauth::CallbackParams;

use super::AuthHttpState;

/// Successful callback response body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackResponse {
    /// The minted session token.
    pub session_token: String,

    /// Unix timestamp at which the session token expires.
    pub expires_at: i64,

    /// Minimal profile of the logged-in user.
    pub user: CallbackUser,
}

/// Minimal user profile returned on login.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackUser {
    /// Application user id.
    pub id: String,
    /// Current email.
    pub email: String,
    /// Display name when the provider reported one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// `GET /auth/callback`
///
/// On success, responds with the session token in the body and as an
/// HTTP-only cookie. When the provider reported an error or sent no
/// code, responds with a redirect to the configured error location
/// rather than a 2xx.
pub async fn callback_handler(
    State(state): State<AuthHttpState>,
    Query(params): Query<CallbackParams>,
) -> Response {
    match state.exchanger.exchange(params).await {
        Ok(outcome) => {
            let mut headers = HeaderMap::new();
            let max_age = u64::try_from(state.tokens.lifetime_secs()).unwrap_or(0);
            if let Some(cookie) = state
                .auth
                .cookie
                .build_cookie(&outcome.session_token, max_age)
                && let Ok(value) = HeaderValue::from_str(&cookie)
            {
                headers.insert(header::SET_COOKIE, value);
            }

            let body = CallbackResponse {
                session_token: outcome.session_token,
                expires_at: outcome.claims.exp,
                user: CallbackUser {
                    id: outcome.user.id,
                    email: outcome.user.email,
                    display_name: outcome.user.display_name,
                },
            };
            (headers, Json(body)).into_response()
        }
        Err(AuthError::ProviderDenied { .. } | AuthError::MissingCode) => {
            Redirect::to(&state.error_redirect).into_response()
        }
        Err(e) => e.into_response(),
    }
}
