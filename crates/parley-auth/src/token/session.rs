//! Session token issuance and verification.
//!
//! After a successful login the application mints its own signed token;
//! every protected request verifies it. Signing is symmetric
//! (HMAC-SHA256) with a single process-wide secret.
//!
//! The verifier pins the expected algorithm instead of trusting the one
//! declared in the token header, closing the algorithm-confusion class
//! of attacks.
//!
//! Verification is a pure function of the token and the secret: it
//! performs no I/O and therefore cannot detect revocation. Callers must
//! pair it with [`crate::authz::RevocationGate`].

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::config::SessionTokenConfig;
use crate::error::AuthError;
use crate::identity::User;

/// Claims carried by a session token.
///
/// This is a fixed structure with required fields: a token with extra,
/// missing, or differently-typed fields fails deserialization and is
/// rejected, so the verifier cannot be steered by claim-shape games.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTokenClaims {
    /// Subject: the application user id.
    pub sub: String,

    /// Email at time of issuance (display only, never a join key).
    pub email: String,

    /// Issued at (unix timestamp).
    pub iat: i64,

    /// Expiration (unix timestamp).
    pub exp: i64,

    /// Issuer.
    pub iss: String,

    /// Audience.
    pub aud: String,
}

/// A freshly minted session token with its claims.
#[derive(Debug, Clone)]
pub struct IssuedSessionToken {
    /// The encoded token string.
    pub token: String,

    /// The claims that were signed into it.
    pub claims: SessionTokenClaims,
}

/// Issues and verifies session tokens.
///
/// Thread-safe; constructed once at startup with the signing secret and
/// shared by reference.
pub struct SessionTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
    lifetime_secs: i64,
}

impl SessionTokenService {
    /// Creates a new service from validated configuration.
    #[must_use]
    pub fn new(
        config: &SessionTokenConfig,
        issuer: impl Into<String>,
        audience: impl Into<String>,
    ) -> Self {
        let secret = config.signing_secret.as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            issuer: issuer.into(),
            audience: audience.into(),
            lifetime_secs: i64::try_from(config.lifetime.as_secs()).unwrap_or(i64::MAX),
        }
    }

    /// Returns the configured token lifetime in seconds.
    #[must_use]
    pub fn lifetime_secs(&self) -> i64 {
        self.lifetime_secs
    }

    /// Mints a session token for a user.
    ///
    /// Claims are derived entirely from the user record and the service
    /// configuration; `exp` is fixed at `iat + lifetime`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if encoding fails.
    pub fn issue(&self, user: &User) -> Result<IssuedSessionToken, AuthError> {
        let iat = OffsetDateTime::now_utc().unix_timestamp();
        let claims = SessionTokenClaims {
            sub: user.id.clone(),
            email: user.email.clone(),
            iat,
            exp: iat + self.lifetime_secs,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = self.encode(&claims)?;
        Ok(IssuedSessionToken { token, claims })
    }

    /// Encodes pre-built claims into a token string.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if encoding fails.
    pub fn encode(&self, claims: &SessionTokenClaims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AuthError::invalid_token(e.to_string()))
    }

    /// Verifies a token string and returns its claims.
    ///
    /// Checks structure, signature, issuer, audience, and expiry. The
    /// accepted algorithm is pinned to HS256 regardless of what the
    /// token header declares.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` for every failure mode; the
    /// message distinguishes them for logs, the wire code does not.
    pub fn verify(&self, token: &str) -> Result<SessionTokenClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.validate_exp = true;

        let data = decode::<SessionTokenClaims>(token, &self.decoding_key, &validation)
            .map_err(map_jwt_error)?;
        Ok(data.claims)
    }
}

fn map_jwt_error(err: jsonwebtoken::errors::Error) -> AuthError {
    use jsonwebtoken::errors::ErrorKind;

    match err.kind() {
        ErrorKind::ExpiredSignature => AuthError::invalid_token("session token expired"),
        ErrorKind::InvalidSignature => AuthError::invalid_token("signature mismatch"),
        ErrorKind::InvalidIssuer => AuthError::invalid_token("wrong issuer"),
        ErrorKind::InvalidAudience => AuthError::invalid_token("wrong audience"),
        _ => AuthError::invalid_token(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn test_service() -> SessionTokenService {
        let config = SessionTokenConfig {
            signing_secret: "0123456789abcdef0123456789abcdef".to_string(),
            lifetime: Duration::from_secs(24 * 3600),
        };
        SessionTokenService::new(&config, "https://parley.example.com", "parley")
    }

    fn test_user() -> User {
        User::new("ext-1", "a@x.com")
    }

    #[test]
    fn test_issue_verify_round_trip() {
        let service = test_service();
        let user = test_user();

        let issued = service.issue(&user).unwrap();
        let claims = service.verify(&issued.token).unwrap();

        assert_eq!(claims, issued.claims);
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.exp, claims.iat + 24 * 3600);
        assert_eq!(claims.iss, "https://parley.example.com");
        assert_eq!(claims.aud, "parley");
    }

    #[test]
    fn test_expired_token_rejected() {
        let service = test_service();
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let claims = SessionTokenClaims {
            sub: "user-1".to_string(),
            email: "a@x.com".to_string(),
            iat: now - 7200,
            exp: now - 3600,
            iss: "https://parley.example.com".to_string(),
            aud: "parley".to_string(),
        };

        let token = service.encode(&claims).unwrap();
        let err = service.verify(&token).unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken { .. }));
        assert!(err.to_string().contains("expired"));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let service = test_service();
        let other = SessionTokenService::new(
            &SessionTokenConfig {
                signing_secret: "ffffffffffffffffffffffffffffffff".to_string(),
                lifetime: Duration::from_secs(3600),
            },
            "https://parley.example.com",
            "parley",
        );

        let issued = service.issue(&test_user()).unwrap();
        assert!(other.verify(&issued.token).is_err());
    }

    #[test]
    fn test_wrong_issuer_and_audience_rejected() {
        let service = test_service();
        let other_issuer = SessionTokenService::new(
            &SessionTokenConfig {
                signing_secret: "0123456789abcdef0123456789abcdef".to_string(),
                lifetime: Duration::from_secs(3600),
            },
            "https://evil.example.com",
            "parley",
        );
        let issued = other_issuer.issue(&test_user()).unwrap();
        assert!(service.verify(&issued.token).is_err());

        let other_audience = SessionTokenService::new(
            &SessionTokenConfig {
                signing_secret: "0123456789abcdef0123456789abcdef".to_string(),
                lifetime: Duration::from_secs(3600),
            },
            "https://parley.example.com",
            "other-app",
        );
        let issued = other_audience.issue(&test_user()).unwrap();
        assert!(service.verify(&issued.token).is_err());
    }

    #[test]
    fn test_malformed_token_rejected() {
        let service = test_service();
        assert!(service.verify("not-a-token").is_err());
        assert!(service.verify("").is_err());
        assert!(service.verify("a.b.c").is_err());
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let service = test_service();
        let issued = service.issue(&test_user()).unwrap();

        // Swap one character of the payload segment.
        let mut parts: Vec<String> = issued.token.split('.').map(String::from).collect();
        let payload = parts[1].clone();
        let flipped = if payload.starts_with('A') { "B" } else { "A" };
        parts[1] = format!("{}{}", flipped, &payload[1..]);
        let tampered = parts.join(".");

        assert!(service.verify(&tampered).is_err());
    }
}
