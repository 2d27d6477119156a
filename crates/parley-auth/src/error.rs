//! Authentication and authorization error types.
//!
//! This module defines all error kinds that can occur during login,
//! session verification, permission evaluation, and webhook
//! authentication. Callers pattern-match on the specific variant; no
//! part of the subsystem signals failure by panicking.

use std::fmt;

/// Errors that can occur during authentication and authorization operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The identity provider reported an error on the callback redirect.
    #[error("Provider denied authorization: {message}")]
    ProviderDenied {
        /// The provider's error code or description.
        message: String,
    },

    /// The callback carried no authorization code.
    #[error("Missing authorization code")]
    MissingCode,

    /// The CSRF state value is unknown, expired, or already consumed.
    #[error("Invalid or already-used state value")]
    InvalidState,

    /// The code exchange or profile fetch against the provider failed.
    ///
    /// This covers network failures, timeouts, and provider 5xx responses.
    #[error("Provider exchange failed: {message}")]
    ProviderExchangeFailed {
        /// Description of the transport or provider failure.
        message: String,
    },

    /// The session token is malformed, has a bad signature, the wrong
    /// issuer or audience, or has expired.
    #[error("Invalid session token: {message}")]
    InvalidToken {
        /// Description of why the token is invalid.
        message: String,
    },

    /// The token is cryptographically valid but the account behind it
    /// has been deactivated.
    #[error("Account revoked")]
    AccountRevoked,

    /// The authenticated user does not hold the required permission.
    #[error("Permission denied: {permission}")]
    PermissionDenied {
        /// The permission that was required.
        permission: String,
    },

    /// An inbound webhook request failed HMAC verification.
    #[error("Webhook signature verification failed: {message}")]
    SignatureVerificationFailed {
        /// Description of the verification failure.
        message: String,
    },

    /// An inbound webhook timestamp falls outside the replay window.
    #[error("Webhook timestamp outside tolerance window")]
    StaleTimestamp,

    /// An error occurred while reading or writing identity data.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage error.
        message: String,
    },

    /// The auth configuration is invalid or incomplete.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `ProviderDenied` error.
    #[must_use]
    pub fn provider_denied(message: impl Into<String>) -> Self {
        Self::ProviderDenied {
            message: message.into(),
        }
    }

    /// Creates a new `ProviderExchangeFailed` error.
    #[must_use]
    pub fn provider_exchange_failed(message: impl Into<String>) -> Self {
        Self::ProviderExchangeFailed {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidToken` error.
    #[must_use]
    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::InvalidToken {
            message: message.into(),
        }
    }

    /// Creates a new `PermissionDenied` error.
    #[must_use]
    pub fn permission_denied(permission: impl Into<String>) -> Self {
        Self::PermissionDenied {
            permission: permission.into(),
        }
    }

    /// Creates a new `SignatureVerificationFailed` error.
    #[must_use]
    pub fn signature_verification_failed(message: impl Into<String>) -> Self {
        Self::SignatureVerificationFailed {
            message: message.into(),
        }
    }

    /// Creates a new `Storage` error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Returns `true` if retrying the operation could succeed.
    ///
    /// Only transport-level failures against the provider or the store
    /// are retryable. A failed code exchange must surface immediately
    /// (authorization codes are single-use), so callers retry at the
    /// level of the whole login flow, never the exchange step.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ProviderExchangeFailed { .. } | Self::Storage { .. }
        )
    }

    /// Returns `true` if this rejection came from the webhook path.
    #[must_use]
    pub fn is_webhook_error(&self) -> bool {
        matches!(
            self,
            Self::SignatureVerificationFailed { .. } | Self::StaleTimestamp
        )
    }

    /// Returns `true` if the caller must re-authenticate to proceed.
    #[must_use]
    pub fn requires_reauthentication(&self) -> bool {
        matches!(self, Self::InvalidToken { .. })
    }

    /// Returns the stable wire error code for this error.
    ///
    /// These codes are part of the external contract and never carry
    /// internal detail. Revocation and permission failures share a code
    /// so that the response does not leak account state.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ProviderDenied { .. } => "provider_denied",
            Self::MissingCode => "missing_code",
            Self::InvalidState => "invalid_state",
            Self::ProviderExchangeFailed { .. } => "provider_exchange_failed",
            Self::InvalidToken { .. } => "invalid_token",
            Self::AccountRevoked | Self::PermissionDenied { .. } => "not_authorized",
            Self::SignatureVerificationFailed { .. } => "invalid_signature",
            Self::StaleTimestamp => "stale_timestamp",
            Self::Storage { .. } | Self::Configuration { .. } => "server_error",
        }
    }

    /// Returns the error category for logging and monitoring.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ProviderDenied { .. }
            | Self::MissingCode
            | Self::InvalidState
            | Self::ProviderExchangeFailed { .. } => ErrorCategory::Login,
            Self::InvalidToken { .. } => ErrorCategory::Token,
            Self::AccountRevoked | Self::PermissionDenied { .. } => ErrorCategory::Authorization,
            Self::SignatureVerificationFailed { .. } | Self::StaleTimestamp => {
                ErrorCategory::Webhook
            }
            Self::Storage { .. } => ErrorCategory::Infrastructure,
            Self::Configuration { .. } => ErrorCategory::Configuration,
        }
    }
}

/// Categories of authentication/authorization errors for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Login-flow errors (provider redirect, state, code exchange).
    Login,
    /// Session token errors (structure, signature, expiry).
    Token,
    /// Authorization errors (revocation, permission checks).
    Authorization,
    /// Webhook signature errors.
    Webhook,
    /// Storage errors.
    Infrastructure,
    /// Configuration errors.
    Configuration,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Login => write!(f, "login"),
            Self::Token => write!(f, "token"),
            Self::Authorization => write!(f, "authorization"),
            Self::Webhook => write!(f, "webhook"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Configuration => write!(f, "configuration"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AuthError::provider_denied("access_denied");
        assert_eq!(
            err.to_string(),
            "Provider denied authorization: access_denied"
        );

        let err = AuthError::invalid_token("signature mismatch");
        assert_eq!(err.to_string(), "Invalid session token: signature mismatch");

        let err = AuthError::AccountRevoked;
        assert_eq!(err.to_string(), "Account revoked");
    }

    #[test]
    fn test_retryable() {
        assert!(AuthError::provider_exchange_failed("timeout").is_retryable());
        assert!(AuthError::storage("connection reset").is_retryable());
        assert!(!AuthError::MissingCode.is_retryable());
        assert!(!AuthError::invalid_token("expired").is_retryable());
        assert!(!AuthError::AccountRevoked.is_retryable());
    }

    #[test]
    fn test_revocation_and_permission_share_wire_code() {
        // Responses must not reveal whether the account exists but is
        // revoked versus simply lacking the permission.
        assert_eq!(
            AuthError::AccountRevoked.error_code(),
            AuthError::permission_denied("broadcast").error_code()
        );
    }

    #[test]
    fn test_error_category() {
        assert_eq!(AuthError::MissingCode.category(), ErrorCategory::Login);
        assert_eq!(
            AuthError::invalid_token("bad").category(),
            ErrorCategory::Token
        );
        assert_eq!(
            AuthError::AccountRevoked.category(),
            ErrorCategory::Authorization
        );
        assert_eq!(AuthError::StaleTimestamp.category(), ErrorCategory::Webhook);
        assert_eq!(
            AuthError::configuration("missing secret").category(),
            ErrorCategory::Configuration
        );
    }

    #[test]
    fn test_webhook_predicates() {
        assert!(AuthError::signature_verification_failed("mismatch").is_webhook_error());
        assert!(AuthError::StaleTimestamp.is_webhook_error());
        assert!(!AuthError::InvalidState.is_webhook_error());
    }

    #[test]
    fn test_requires_reauthentication() {
        assert!(AuthError::invalid_token("expired").requires_reauthentication());
        // Revocation cannot be fixed by logging in again.
        assert!(!AuthError::AccountRevoked.requires_reauthentication());
    }
}
