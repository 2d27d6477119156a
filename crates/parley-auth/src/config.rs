//! Authentication configuration.
//!
//! All secrets and provider settings are loaded once at process start
//! and passed by reference into the components that need them. Nothing
//! in a request path reads ambient global state, which keeps every
//! component testable with injected secrets.
//!
//! Missing secrets are a startup failure: [`AuthConfig::validate`] is
//! called before the listener binds, and any error it returns aborts
//! the process.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Errors produced while validating the auth configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required setting is missing or empty.
    #[error("Missing required setting: {setting}")]
    Missing {
        /// The setting that is absent.
        setting: String,
    },

    /// A setting has an unusable value.
    #[error("Invalid setting {setting}: {message}")]
    Invalid {
        /// The setting in question.
        setting: String,
        /// Why the value is unusable.
        message: String,
    },
}

impl ConfigError {
    /// Creates a new `Missing` error.
    #[must_use]
    pub fn missing(setting: impl Into<String>) -> Self {
        Self::Missing {
            setting: setting.into(),
        }
    }

    /// Creates a new `Invalid` error.
    #[must_use]
    pub fn invalid(setting: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            setting: setting.into(),
            message: message.into(),
        }
    }
}

/// Root authentication configuration.
///
/// # Example (TOML)
///
/// ```toml
/// [auth]
/// issuer = "https://parley.example.com"
/// audience = "parley"
///
/// [auth.session]
/// lifetime = "24h"
///
/// [auth.provider]
/// client_id = "..."
/// tenant = "common"
/// redirect_uri = "https://parley.example.com/auth/callback"
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Issuer URL placed in the session token `iss` claim.
    pub issuer: String,

    /// Audience placed in the session token `aud` claim.
    pub audience: String,

    /// Hex-encoded 256-bit key used to seal stored provider tokens.
    pub encryption_key: String,

    /// Session token settings.
    pub session: SessionTokenConfig,

    /// External identity provider settings.
    pub provider: ProviderConfig,

    /// CSRF state settings for the login redirect round trip.
    pub state: StateConfig,

    /// Inbound webhook verification settings.
    pub webhook: WebhookConfig,

    /// Session cookie settings.
    pub cookie: CookieConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            issuer: "http://localhost:8080".to_string(),
            audience: "parley".to_string(),
            encryption_key: String::new(),
            session: SessionTokenConfig::default(),
            provider: ProviderConfig::default(),
            state: StateConfig::default(),
            webhook: WebhookConfig::default(),
            cookie: CookieConfig::default(),
        }
    }
}

impl AuthConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns the first missing or invalid setting. Callers treat any
    /// error as fatal at startup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.issuer.is_empty() {
            return Err(ConfigError::missing("auth.issuer"));
        }
        if self.audience.is_empty() {
            return Err(ConfigError::missing("auth.audience"));
        }
        if self.encryption_key.is_empty() {
            return Err(ConfigError::missing("auth.encryption_key"));
        }
        if hex::decode(&self.encryption_key)
            .map(|k| k.len() != 32)
            .unwrap_or(true)
        {
            return Err(ConfigError::invalid(
                "auth.encryption_key",
                "expected 64 hex characters (256-bit key)",
            ));
        }
        self.session.validate()?;
        self.provider.validate()?;
        self.webhook.validate()?;
        Ok(())
    }
}

/// Session token settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionTokenConfig {
    /// Secret used to sign and verify session tokens (HMAC-SHA256).
    pub signing_secret: String,

    /// Token lifetime from issuance.
    #[serde(with = "humantime_serde")]
    pub lifetime: Duration,
}

impl Default for SessionTokenConfig {
    fn default() -> Self {
        Self {
            signing_secret: String::new(),
            lifetime: Duration::from_secs(24 * 3600),
        }
    }
}

impl SessionTokenConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.signing_secret.is_empty() {
            return Err(ConfigError::missing("auth.session.signing_secret"));
        }
        if self.signing_secret.len() < 32 {
            return Err(ConfigError::invalid(
                "auth.session.signing_secret",
                "must be at least 32 bytes",
            ));
        }
        if self.lifetime.is_zero() {
            return Err(ConfigError::invalid(
                "auth.session.lifetime",
                "must be non-zero",
            ));
        }
        Ok(())
    }
}

/// External identity provider settings.
///
/// The authorize and token endpoints are derived from the tenant unless
/// overridden explicitly (deployments behind a gateway override them).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// OAuth client id registered with the provider.
    pub client_id: String,

    /// OAuth client secret.
    pub client_secret: String,

    /// Provider tenant identifier.
    pub tenant: String,

    /// Redirect URI registered for the callback.
    pub redirect_uri: String,

    /// Scopes requested on the authorize redirect.
    pub scopes: Vec<String>,

    /// Override for the derived authorize endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorize_endpoint: Option<String>,

    /// Override for the derived token endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_endpoint: Option<String>,

    /// Override for the derived profile endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_endpoint: Option<String>,

    /// Location the callback redirects to when the provider reports an
    /// error or the code is missing.
    pub error_redirect: String,

    /// Timeout applied to every provider HTTP call.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            tenant: "common".to_string(),
            redirect_uri: String::new(),
            scopes: vec![
                "openid".to_string(),
                "profile".to_string(),
                "email".to_string(),
            ],
            authorize_endpoint: None,
            token_endpoint: None,
            profile_endpoint: None,
            error_redirect: "/login?error=auth_failed".to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl ProviderConfig {
    /// Returns the authorize endpoint, derived from the tenant unless
    /// overridden.
    #[must_use]
    pub fn authorize_endpoint(&self) -> String {
        self.authorize_endpoint.clone().unwrap_or_else(|| {
            format!(
                "https://login.microsoftonline.com/{}/oauth2/v2.0/authorize",
                self.tenant
            )
        })
    }

    /// Returns the token endpoint, derived from the tenant unless
    /// overridden.
    #[must_use]
    pub fn token_endpoint(&self) -> String {
        self.token_endpoint.clone().unwrap_or_else(|| {
            format!(
                "https://login.microsoftonline.com/{}/oauth2/v2.0/token",
                self.tenant
            )
        })
    }

    /// Returns the profile endpoint, derived unless overridden.
    #[must_use]
    pub fn profile_endpoint(&self) -> String {
        self.profile_endpoint
            .clone()
            .unwrap_or_else(|| "https://graph.microsoft.com/v1.0/me".to_string())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.client_id.is_empty() {
            return Err(ConfigError::missing("auth.provider.client_id"));
        }
        if self.client_secret.is_empty() {
            return Err(ConfigError::missing("auth.provider.client_secret"));
        }
        if self.tenant.is_empty() {
            return Err(ConfigError::missing("auth.provider.tenant"));
        }
        if self.redirect_uri.is_empty() {
            return Err(ConfigError::missing("auth.provider.redirect_uri"));
        }
        Ok(())
    }
}

/// CSRF state settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StateConfig {
    /// How long a registered state value stays consumable.
    ///
    /// Bounded by the provider redirect round trip; a few minutes is
    /// plenty.
    #[serde(with = "humantime_serde")]
    pub ttl: Duration,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(600),
        }
    }
}

/// Inbound webhook verification settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Shared secret used to verify inbound signatures.
    ///
    /// Never transmitted; rotated out-of-band.
    pub signing_secret: String,

    /// Maximum accepted age (in either direction) of the claimed
    /// request timestamp.
    #[serde(with = "humantime_serde")]
    pub timestamp_tolerance: Duration,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            signing_secret: String::new(),
            timestamp_tolerance: Duration::from_secs(300),
        }
    }
}

impl WebhookConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.signing_secret.is_empty() {
            return Err(ConfigError::missing("auth.webhook.signing_secret"));
        }
        Ok(())
    }
}

/// Session cookie settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CookieConfig {
    /// Whether the session cookie is set on login.
    pub enabled: bool,

    /// Cookie name.
    pub name: String,

    /// `Secure` attribute.
    pub secure: bool,

    /// `HttpOnly` attribute.
    pub http_only: bool,

    /// `SameSite` attribute value.
    pub same_site: String,

    /// Cookie path.
    pub path: String,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            name: "parley_session".to_string(),
            secure: true,
            http_only: true,
            same_site: "Strict".to_string(),
            path: "/".to_string(),
        }
    }
}

impl CookieConfig {
    /// Builds a `Set-Cookie` header value carrying the session token.
    ///
    /// Returns `None` when cookie auth is disabled.
    #[must_use]
    pub fn build_cookie(&self, token: &str, max_age_secs: u64) -> Option<String> {
        if !self.enabled {
            return None;
        }
        let mut cookie = format!(
            "{}={}; Max-Age={}; Path={}; SameSite={}",
            self.name, token, max_age_secs, self.path, self.same_site
        );
        if self.http_only {
            cookie.push_str("; HttpOnly");
        }
        if self.secure {
            cookie.push_str("; Secure");
        }
        Some(cookie)
    }

    /// Builds a `Set-Cookie` header value that clears the session cookie.
    #[must_use]
    pub fn clear_cookie(&self) -> Option<String> {
        if !self.enabled {
            return None;
        }
        Some(format!(
            "{}=; Max-Age=0; Path={}; SameSite={}",
            self.name, self.path, self.same_site
        ))
    }
}
