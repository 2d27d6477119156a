//! Session extractors for Axum.
//!
//! [`SessionAuth`] chains the two authorization layers on every
//! protected request: token verification (pure) followed by the
//! revocation gate (live store lookup). [`AdminAuth`] additionally
//! requires the `admin` permission.
//!
//! The token is looked for in three places, in order: the
//! `Authorization: Bearer` header, the session cookie, and a `token`
//! query parameter.

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, header::COOKIE, request::Parts},
};

use crate::authz::{PermissionEvaluator, RevocationGate};
use crate::config::CookieConfig;
use crate::error::AuthError;
use crate::identity::permission::ADMIN_PERMISSION;
use crate::token::SessionTokenService;

use super::types::AuthContext;

// =============================================================================
// Auth State
// =============================================================================

/// State required by the session extractors.
///
/// Include this in the application state and expose it via `FromRef`.
#[derive(Clone)]
pub struct AuthState {
    /// Token verifier.
    pub tokens: Arc<SessionTokenService>,

    /// Revocation gate, consulted on every request.
    pub gate: Arc<RevocationGate>,

    /// Permission evaluator for admin checks.
    pub permissions: Arc<PermissionEvaluator>,

    /// Session cookie settings (name used for extraction).
    pub cookie: CookieConfig,
}

// =============================================================================
// Session Auth Extractor
// =============================================================================

/// Axum extractor that authenticates and authorizes the request.
///
/// 1. Extracts the token (header, then cookie, then query parameter).
/// 2. Verifies signature, issuer, audience, and expiry.
/// 3. Runs the revocation gate against the identity store.
///
/// Any failing step rejects the request with the matching `AuthError`.
pub struct SessionAuth(pub AuthContext);

impl<S> FromRequestParts<S> for SessionAuth
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);

        let token = extract_token(parts, &auth_state.cookie)
            .ok_or_else(|| AuthError::invalid_token("No session token presented"))?;

        let claims = auth_state.tokens.verify(&token)?;
        let user = auth_state.gate.check(&claims).await?;

        tracing::debug!(user_id = %user.id, "Session authenticated");

        Ok(SessionAuth(AuthContext {
            claims: Arc::new(claims),
            user,
        }))
    }
}

// =============================================================================
// Admin Auth Extractor
// =============================================================================

/// Axum extractor that additionally requires the `admin` permission.
pub struct AdminAuth(pub AuthContext);

impl<S> FromRequestParts<S> for AdminAuth
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let SessionAuth(context) = SessionAuth::from_request_parts(parts, state).await?;

        let auth_state = AuthState::from_ref(state);
        if !auth_state.permissions.is_admin(context.user_id()).await? {
            tracing::warn!(user_id = %context.user_id(), "Admin endpoint denied");
            return Err(AuthError::permission_denied(ADMIN_PERMISSION));
        }

        Ok(AdminAuth(context))
    }
}

// =============================================================================
// Token Extraction
// =============================================================================

/// Extracts the session token: Bearer header, cookie, query parameter,
/// in that precedence order.
fn extract_token(parts: &Parts, cookie_config: &CookieConfig) -> Option<String> {
    if let Some(token) = extract_bearer(parts) {
        return Some(token);
    }
    if let Some(token) = extract_from_cookie(parts, cookie_config) {
        return Some(token);
    }
    extract_from_query(parts)
}

fn extract_bearer(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(ToString::to_string)
}

fn extract_from_cookie(parts: &Parts, cookie_config: &CookieConfig) -> Option<String> {
    if !cookie_config.enabled {
        return None;
    }
    let header = parts.headers.get(COOKIE)?.to_str().ok()?;
    for cookie in header.split(';') {
        if let Some((name, value)) = cookie.trim().split_once('=')
            && name.trim() == cookie_config.name
        {
            let value = value.trim();
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}

fn extract_from_query(parts: &Parts) -> Option<String> {
    let query = parts.uri.query()?;
    for pair in query.split('&') {
        if let Some((key, value)) = pair.split_once('=')
            && key == "token"
            && !value.is_empty()
        {
            return Some(value.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts_for(request: Request<()>) -> Parts {
        request.into_parts().0
    }

    #[test]
    fn test_bearer_header_wins_over_cookie_and_query() {
        let request = Request::builder()
            .uri("/protected?token=from-query")
            .header(AUTHORIZATION, "Bearer from-header")
            .header(COOKIE, "parley_session=from-cookie")
            .body(())
            .unwrap();

        let token = extract_token(&parts_for(request), &CookieConfig::default());
        assert_eq!(token.as_deref(), Some("from-header"));
    }

    #[test]
    fn test_cookie_wins_over_query() {
        let request = Request::builder()
            .uri("/protected?token=from-query")
            .header(COOKIE, "other=1; parley_session=from-cookie")
            .body(())
            .unwrap();

        let token = extract_token(&parts_for(request), &CookieConfig::default());
        assert_eq!(token.as_deref(), Some("from-cookie"));
    }

    #[test]
    fn test_query_parameter_fallback() {
        let request = Request::builder()
            .uri("/protected?token=from-query")
            .body(())
            .unwrap();

        let token = extract_token(&parts_for(request), &CookieConfig::default());
        assert_eq!(token.as_deref(), Some("from-query"));
    }

    #[test]
    fn test_disabled_cookie_is_skipped() {
        let request = Request::builder()
            .uri("/protected")
            .header(COOKIE, "parley_session=from-cookie")
            .body(())
            .unwrap();

        let config = CookieConfig {
            enabled: false,
            ..CookieConfig::default()
        };
        assert!(extract_token(&parts_for(request), &config).is_none());
    }

    #[test]
    fn test_empty_bearer_is_ignored() {
        let request = Request::builder()
            .uri("/protected")
            .header(AUTHORIZATION, "Bearer ")
            .body(())
            .unwrap();

        assert!(extract_token(&parts_for(request), &CookieConfig::default()).is_none());
    }
}
