//! Application state construction.

use std::sync::Arc;

use parley_auth::audit::{AuditSink, TracingAuditSink};
use parley_auth::config::AuthConfig;
use parley_auth::error::AuthError;
use parley_auth::http::AuthHttpState;
use parley_auth::identity::IdentityStore;
use parley_auth::middleware::AuthState;
use parley_auth::oauth::{CallbackExchanger, LoginRequestBuilder, StateStore};
use parley_auth::token::SessionTokenService;
use parley_auth::webhook::WebhookSignatureVerifier;
use parley_auth::{PermissionEvaluator, RevocationGate, TokenCipher};

use parley_auth_memory::{InMemoryIdentityStore, InMemoryStateStore};

/// Builds the auth HTTP state from validated configuration.
///
/// Storage is the in-memory backend; swapping in a persistent backend
/// means swapping these two constructors.
///
/// # Errors
///
/// Returns an error if the encryption key is unusable (validation has
/// normally caught this already).
pub fn build_auth_state(config: &AuthConfig) -> Result<AuthHttpState, AuthError> {
    let identities: Arc<dyn IdentityStore> = Arc::new(InMemoryIdentityStore::new());
    let states: Arc<dyn StateStore> = Arc::new(InMemoryStateStore::new());
    let audit: Arc<dyn AuditSink> = Arc::new(TracingAuditSink);

    let cipher = TokenCipher::from_hex_key(&config.encryption_key)?;
    let tokens = Arc::new(SessionTokenService::new(
        &config.session,
        &config.issuer,
        &config.audience,
    ));

    let gate = Arc::new(RevocationGate::new(identities.clone()));
    let permissions = Arc::new(PermissionEvaluator::new(identities.clone()));

    let login = Arc::new(LoginRequestBuilder::new(
        config.provider.clone(),
        config.state.clone(),
        states.clone(),
    ));
    let exchanger = Arc::new(CallbackExchanger::new(
        config.provider.clone(),
        states,
        identities.clone(),
        tokens.clone(),
        cipher,
        audit.clone(),
    ));

    Ok(AuthHttpState {
        auth: AuthState {
            tokens: tokens.clone(),
            gate,
            permissions,
            cookie: config.cookie.clone(),
        },
        login,
        exchanger,
        tokens,
        identities,
        audit,
        webhooks: WebhookSignatureVerifier::new(&config.webhook),
        error_redirect: config.provider.error_redirect.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_auth_state_from_valid_config() {
        let config = AuthConfig {
            issuer: "https://parley.example.com".to_string(),
            audience: "parley".to_string(),
            encryption_key: "ab".repeat(32),
            session: parley_auth::config::SessionTokenConfig {
                signing_secret: "0123456789abcdef0123456789abcdef".to_string(),
                lifetime: std::time::Duration::from_secs(3600),
            },
            ..AuthConfig::default()
        };

        let state = build_auth_state(&config).unwrap();
        assert_eq!(state.error_redirect, "/login?error=auth_failed");
    }

    #[test]
    fn test_bad_encryption_key_is_rejected() {
        let config = AuthConfig {
            encryption_key: "zz".to_string(),
            ..AuthConfig::default()
        };
        assert!(build_auth_state(&config).is_err());
    }
}
