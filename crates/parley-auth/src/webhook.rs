//! Webhook signature verification.
//!
//! Events delivered by the messaging platform are authenticated with an
//! HMAC signature, entirely independent of the session-token path. The
//! platform signs `"v0:{timestamp}:{raw body}"` with the shared secret
//! and sends the hex digest as `v0=<hex>` alongside the timestamp.
//!
//! Two properties are easy to get wrong and are load-bearing here:
//!
//! - The comparison is constant-time (`Mac::verify_slice`), never a
//!   short-circuiting string equality.
//! - Verification consumes the raw body bytes exactly as received.
//!   Re-serializing a parsed body before hashing breaks the contract.
//!
//! The claimed timestamp is also checked against the current time with
//! a bounded tolerance window to reject replayed requests.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use time::OffsetDateTime;

use crate::AuthResult;
use crate::config::WebhookConfig;
use crate::error::AuthError;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the unix-seconds timestamp of the request.
pub const TIMESTAMP_HEADER: &str = "x-signature-timestamp";

/// Header carrying the `v0=<hex>` signature.
pub const SIGNATURE_HEADER: &str = "x-signature";

/// Signature version prefix.
const VERSION: &str = "v0";

/// Verifies inbound webhook signatures.
#[derive(Clone)]
pub struct WebhookSignatureVerifier {
    secret: String,
    tolerance_secs: i64,
}

impl WebhookSignatureVerifier {
    /// Creates a verifier from validated configuration.
    #[must_use]
    pub fn new(config: &WebhookConfig) -> Self {
        Self {
            secret: config.signing_secret.clone(),
            tolerance_secs: i64::try_from(config.timestamp_tolerance.as_secs())
                .unwrap_or(i64::MAX),
        }
    }

    /// Verifies a request.
    ///
    /// `timestamp` and `signature` are the raw header values (absent
    /// headers are rejected); `body` is the raw request body exactly as
    /// received.
    ///
    /// # Errors
    ///
    /// - `AuthError::SignatureVerificationFailed` for a missing or
    ///   malformed header, or a digest mismatch.
    /// - `AuthError::StaleTimestamp` when the claimed timestamp falls
    ///   outside the tolerance window in either direction.
    pub fn verify(
        &self,
        timestamp: Option<&str>,
        signature: Option<&str>,
        body: &[u8],
    ) -> AuthResult<()> {
        let timestamp = timestamp.ok_or_else(|| {
            AuthError::signature_verification_failed("Missing timestamp header")
        })?;
        let signature = signature.ok_or_else(|| {
            AuthError::signature_verification_failed("Missing signature header")
        })?;

        let claimed_ts: i64 = timestamp.parse().map_err(|_| {
            AuthError::signature_verification_failed("Malformed timestamp header")
        })?;

        let now = OffsetDateTime::now_utc().unix_timestamp();
        if (now - claimed_ts).abs() > self.tolerance_secs {
            tracing::warn!(
                claimed = claimed_ts,
                now,
                "Rejected webhook with timestamp outside tolerance"
            );
            return Err(AuthError::StaleTimestamp);
        }

        let claimed_hex = signature.strip_prefix("v0=").ok_or_else(|| {
            AuthError::signature_verification_failed("Signature missing v0= prefix")
        })?;
        let claimed = hex::decode(claimed_hex).map_err(|_| {
            AuthError::signature_verification_failed("Signature is not valid hex")
        })?;

        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|e| AuthError::configuration(format!("Invalid webhook secret: {e}")))?;
        mac.update(format!("{VERSION}:{timestamp}:").as_bytes());
        mac.update(body);

        // verify_slice is constant-time.
        mac.verify_slice(&claimed)
            .map_err(|_| AuthError::signature_verification_failed("Digest mismatch"))
    }

    /// Computes the expected signature for a timestamp and body.
    ///
    /// Used by clients and tests to produce well-formed requests.
    #[must_use]
    pub fn sign(secret: &str, timestamp: i64, body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .expect("HMAC accepts keys of any length");
        mac.update(format!("{VERSION}:{timestamp}:").as_bytes());
        mac.update(body);
        format!("v0={}", hex::encode(mac.finalize().into_bytes()))
    }
}
