//! Callback exchange: authorization code to application session.
//!
//! The exchanger performs the second half of the login flow:
//!
//! 1. Reject provider errors and missing codes.
//! 2. Consume the echoed CSRF state (single use).
//! 3. Exchange the code for provider tokens and fetch the profile.
//! 4. Resolve the identity by its stable external id (create on first
//!    login, update after), sealing the provider access token before it
//!    touches the store.
//! 5. Mint the application session token.
//! 6. Record one login audit event, success or failure.
//!
//! All provider I/O happens before any store write, so a timed-out
//! exchange or profile fetch leaves no partial identity behind. The
//! code-exchange step is never retried (codes are single-use); the
//! profile fetch is an idempotent read and is retried once on transport
//! failure.

use std::sync::Arc;

use serde::Deserialize;
use time::OffsetDateTime;

use crate::AuthResult;
use crate::audit::{AuditSink, AuthAction, AuthEvent, record_event};
use crate::config::ProviderConfig;
use crate::error::AuthError;
use crate::identity::{IdentityStore, User};
use crate::secrets::TokenCipher;
use crate::token::{SessionTokenClaims, SessionTokenService};

use super::state::StateStore;

/// Query parameters delivered to the callback endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    /// Authorization code, present on success.
    pub code: Option<String>,

    /// Echoed CSRF state value.
    pub state: Option<String>,

    /// Provider error code, present when the user denied or the
    /// provider failed.
    pub error: Option<String>,
}

/// Result of a successful callback exchange.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    /// The resolved (created or updated) user.
    pub user: User,

    /// The minted session token.
    pub session_token: String,

    /// Claims signed into the session token.
    pub claims: SessionTokenClaims,

    /// Seconds until the provider access token expires, when reported.
    ///
    /// Returned for advanced flows that call the provider's API on the
    /// user's behalf; the token itself stays sealed in the store.
    pub provider_token_expires_in: Option<u64>,

    /// Whether this exchange created the user.
    pub is_new_user: bool,
}

/// Token response from the provider's token endpoint.
#[derive(Debug, Deserialize)]
struct ProviderTokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// User profile as returned by the provider's profile endpoint.
#[derive(Debug, Deserialize)]
struct ProviderProfile {
    id: String,
    #[serde(default, alias = "mail")]
    email: Option<String>,
    #[serde(default, alias = "userPrincipalName")]
    user_principal_name: Option<String>,
    #[serde(default, alias = "displayName")]
    display_name: Option<String>,
    #[serde(default, alias = "avatarUrl")]
    avatar_url: Option<String>,
}

impl ProviderProfile {
    /// Best-effort email: the mail attribute, falling back to the UPN.
    fn email(&self) -> Option<&str> {
        self.email
            .as_deref()
            .or(self.user_principal_name.as_deref())
    }
}

/// Exchanges authorization codes for application sessions.
pub struct CallbackExchanger {
    http_client: reqwest::Client,
    provider: ProviderConfig,
    states: Arc<dyn StateStore>,
    identities: Arc<dyn IdentityStore>,
    tokens: Arc<SessionTokenService>,
    cipher: TokenCipher,
    audit: Arc<dyn AuditSink>,
}

impl CallbackExchanger {
    /// Creates a new exchanger.
    ///
    /// The HTTP client carries the configured provider timeout; every
    /// exchange and profile fetch is bounded by it.
    #[must_use]
    pub fn new(
        provider: ProviderConfig,
        states: Arc<dyn StateStore>,
        identities: Arc<dyn IdentityStore>,
        tokens: Arc<SessionTokenService>,
        cipher: TokenCipher,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(provider.request_timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http_client,
            provider,
            states,
            identities,
            tokens,
            cipher,
            audit,
        }
    }

    /// Runs the full callback exchange.
    ///
    /// Emits exactly one `login` audit event regardless of outcome.
    ///
    /// # Errors
    ///
    /// See the module documentation for the failure contract; every
    /// error is terminal for this login attempt.
    pub async fn exchange(&self, params: CallbackParams) -> AuthResult<LoginOutcome> {
        let result = self.exchange_inner(params).await;

        match &result {
            Ok(outcome) => {
                record_event(
                    self.audit.as_ref(),
                    AuthEvent::success(AuthAction::Login, outcome.user.id.clone())
                        .with_detail("external_id", outcome.user.external_id.clone())
                        .with_detail("new_user", outcome.is_new_user),
                )
                .await;
            }
            Err(e) => {
                record_event(
                    self.audit.as_ref(),
                    AuthEvent::failure(AuthAction::Login, None)
                        .with_detail("reason", e.error_code()),
                )
                .await;
            }
        }

        result
    }

    async fn exchange_inner(&self, params: CallbackParams) -> AuthResult<LoginOutcome> {
        if let Some(error) = params.error {
            return Err(AuthError::provider_denied(error));
        }
        let code = params.code.ok_or(AuthError::MissingCode)?;
        let state = params.state.ok_or(AuthError::InvalidState)?;

        if !self.states.consume(&state).await? {
            tracing::warn!("Callback carried an unknown or already-consumed state value");
            return Err(AuthError::InvalidState);
        }

        // All provider I/O happens before any identity write.
        let token_response = self.exchange_code(&code).await?;
        let profile = self.fetch_profile(&token_response.access_token).await?;

        let email = profile
            .email()
            .ok_or_else(|| {
                AuthError::provider_exchange_failed("Provider profile carries no email")
            })?
            .to_string();

        let sealed = self.cipher.seal(&token_response.access_token)?;
        let now = OffsetDateTime::now_utc();

        let (user, is_new_user) = match self
            .identities
            .find_by_external_id(&profile.id)
            .await?
        {
            Some(mut user) => {
                user.apply_profile(email, profile.display_name, profile.avatar_url);
                user.sealed_access_token = Some(sealed);
                self.identities.update(&user).await?;
                self.identities.record_login(&user.id, now).await?;
                user.last_login_at = Some(now);
                (user, false)
            }
            None => {
                let mut user = User::new(profile.id.clone(), email);
                user.display_name = profile.display_name;
                user.avatar_url = profile.avatar_url;
                user.sealed_access_token = Some(sealed);
                user.last_login_at = Some(now);
                self.identities.create(&user).await?;
                tracing::info!(external_id = %user.external_id, "Created user on first login");
                (user, true)
            }
        };

        let issued = self.tokens.issue(&user)?;

        Ok(LoginOutcome {
            user,
            session_token: issued.token,
            claims: issued.claims,
            provider_token_expires_in: token_response.expires_in,
            is_new_user,
        })
    }

    /// Exchanges the authorization code at the provider token endpoint.
    ///
    /// Never retried: authorization codes are single-use, so a retry
    /// would fail anyway and must surface immediately.
    async fn exchange_code(&self, code: &str) -> AuthResult<ProviderTokenResponse> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", &self.provider.redirect_uri),
            ("client_id", &self.provider.client_id),
            ("client_secret", &self.provider.client_secret),
        ];

        let response = self
            .http_client
            .post(self.provider.token_endpoint())
            .form(&params)
            .send()
            .await
            .map_err(|e| AuthError::provider_exchange_failed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, "Provider token endpoint rejected the code exchange");
            return Err(AuthError::provider_exchange_failed(format!(
                "token endpoint returned {status}: {body}"
            )));
        }

        response
            .json::<ProviderTokenResponse>()
            .await
            .map_err(|e| {
                AuthError::provider_exchange_failed(format!("Invalid token response: {e}"))
            })
    }

    /// Fetches the user profile, retrying once on transport failure.
    async fn fetch_profile(&self, access_token: &str) -> AuthResult<ProviderProfile> {
        match self.fetch_profile_once(access_token).await {
            Err(e) if e.is_retryable() => {
                tracing::debug!(error = %e, "Profile fetch failed, retrying once");
                self.fetch_profile_once(access_token).await
            }
            other => other,
        }
    }

    async fn fetch_profile_once(&self, access_token: &str) -> AuthResult<ProviderProfile> {
        let response = self
            .http_client
            .get(self.provider.profile_endpoint())
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AuthError::provider_exchange_failed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AuthError::provider_exchange_failed(format!(
                "profile endpoint returned {status}"
            )));
        }

        response
            .json::<ProviderProfile>()
            .await
            .map_err(|e| AuthError::provider_exchange_failed(format!("Invalid profile: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_email_falls_back_to_upn() {
        let profile = ProviderProfile {
            id: "ext-1".to_string(),
            email: None,
            user_principal_name: Some("alice@acme.com".to_string()),
            display_name: None,
            avatar_url: None,
        };
        assert_eq!(profile.email(), Some("alice@acme.com"));

        let profile = ProviderProfile {
            id: "ext-1".to_string(),
            email: Some("mail@acme.com".to_string()),
            user_principal_name: Some("upn@acme.com".to_string()),
            display_name: None,
            avatar_url: None,
        };
        assert_eq!(profile.email(), Some("mail@acme.com"));
    }

    #[test]
    fn test_profile_deserializes_provider_field_names() {
        let json = r#"{
            "id": "ext-42",
            "mail": "bob@acme.com",
            "displayName": "Bob",
            "userPrincipalName": "bob@acme.onmicrosoft.com"
        }"#;
        let profile: ProviderProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.id, "ext-42");
        assert_eq!(profile.email.as_deref(), Some("bob@acme.com"));
        assert_eq!(profile.display_name.as_deref(), Some("Bob"));
    }

    #[test]
    fn test_token_response_tolerates_missing_expiry() {
        let json = r#"{"access_token": "at-1", "token_type": "Bearer"}"#;
        let response: ProviderTokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.access_token, "at-1");
        assert!(response.expires_in.is_none());
    }
}
