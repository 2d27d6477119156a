//! Error responses for authentication failures.
//!
//! Implements `IntoResponse` for `AuthError`. Responses carry a stable
//! wire code and a generic message - never internal detail - and
//! revocation is indistinguishable from a missing permission.

use axum::{
    Json,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::error::AuthError;

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = response_details(&self);
        let code = self.error_code();

        if status.is_server_error() {
            tracing::error!(error = %self, code, "Auth request failed");
        } else {
            tracing::debug!(error = %self, code, "Auth request rejected");
        }

        let body = json!({
            "error": code,
            "message": message,
        });

        let mut headers = HeaderMap::new();
        if status == StatusCode::UNAUTHORIZED {
            headers.insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static("Bearer"),
            );
        }

        (status, headers, Json(body)).into_response()
    }
}

/// Maps an error to its HTTP status and user-facing message.
///
/// Messages are fixed per code; whatever internal detail the error
/// carries stays in the logs.
fn response_details(error: &AuthError) -> (StatusCode, &'static str) {
    match error {
        AuthError::ProviderDenied { .. } => {
            (StatusCode::BAD_REQUEST, "The provider denied authorization")
        }
        AuthError::MissingCode => (StatusCode::BAD_REQUEST, "Missing authorization code"),
        AuthError::InvalidState => (StatusCode::BAD_REQUEST, "Invalid state value"),
        AuthError::ProviderExchangeFailed { .. } => (
            StatusCode::BAD_GATEWAY,
            "Could not complete the login with the provider",
        ),
        AuthError::InvalidToken { .. } => (
            StatusCode::UNAUTHORIZED,
            "Invalid or expired session token",
        ),
        AuthError::AccountRevoked | AuthError::PermissionDenied { .. } => {
            (StatusCode::FORBIDDEN, "Not authorized")
        }
        AuthError::SignatureVerificationFailed { .. } => {
            (StatusCode::UNAUTHORIZED, "Signature verification failed")
        }
        AuthError::StaleTimestamp => (StatusCode::UNAUTHORIZED, "Request timestamp too old"),
        AuthError::Storage { .. } | AuthError::Configuration { .. } => {
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let (status, _) = response_details(&AuthError::MissingCode);
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = response_details(&AuthError::invalid_token("detail"));
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = response_details(&AuthError::StaleTimestamp);
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = response_details(&AuthError::storage("db down"));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_revocation_indistinguishable_from_permission_denial() {
        let revoked = response_details(&AuthError::AccountRevoked);
        let denied = response_details(&AuthError::permission_denied("broadcast"));
        assert_eq!(revoked, denied);
    }

    #[test]
    fn test_messages_never_leak_internal_detail() {
        let (_, message) = response_details(&AuthError::storage("password=hunter2"));
        assert!(!message.contains("hunter2"));

        let (_, message) = response_details(&AuthError::invalid_token("kid header junk"));
        assert!(!message.contains("kid"));
    }

    #[test]
    fn test_unauthorized_carries_www_authenticate() {
        let response = AuthError::invalid_token("bad").into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));
    }
}
