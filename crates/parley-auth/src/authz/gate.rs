//! Revocation gate.
//!
//! Signed tokens are cheap to verify but cannot be revoked
//! cryptographically. The gate reconciles the two: authorization is
//! the conjunction of (valid signature ∧ not expired ∧ account still
//! active), and any failing clause rejects the request.
//!
//! The gate performs a live store lookup on every call. There is no
//! cache; adding one would trade immediate revocation for latency and
//! must not happen silently.

use std::sync::Arc;

use crate::AuthResult;
use crate::error::AuthError;
use crate::identity::{IdentityStore, User};
use crate::token::SessionTokenClaims;

/// Confirms the account behind verified claims is still active.
pub struct RevocationGate {
    identities: Arc<dyn IdentityStore>,
}

impl RevocationGate {
    /// Creates a new gate.
    #[must_use]
    pub fn new(identities: Arc<dyn IdentityStore>) -> Self {
        Self { identities }
    }

    /// Checks the user referenced by verified claims.
    ///
    /// Returns the live user record so callers do not need a second
    /// lookup.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::AccountRevoked` if the user is missing or
    /// inactive - the token being cryptographically valid does not
    /// matter. A missing user gets the same error as a revoked one so
    /// responses do not reveal which it was.
    pub async fn check(&self, claims: &SessionTokenClaims) -> AuthResult<User> {
        match self.identities.find_by_id(&claims.sub).await? {
            Some(user) if user.is_active() => Ok(user),
            Some(_) => {
                tracing::warn!(user_id = %claims.sub, "Rejected valid token for revoked account");
                Err(AuthError::AccountRevoked)
            }
            None => {
                tracing::warn!(user_id = %claims.sub, "Rejected valid token for unknown user");
                Err(AuthError::AccountRevoked)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;

    use super::*;
    use crate::authz::evaluator::tests::StubIdentityStore;

    fn claims_for(user_id: &str) -> SessionTokenClaims {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        SessionTokenClaims {
            sub: user_id.to_string(),
            email: "a@x.com".to_string(),
            iat: now,
            exp: now + 3600,
            iss: "https://parley.example.com".to_string(),
            aud: "parley".to_string(),
        }
    }

    #[tokio::test]
    async fn test_active_user_passes() {
        let store = Arc::new(StubIdentityStore::default());
        let user = store.insert_user("ext-1", "a@x.com", true);
        let gate = RevocationGate::new(store);

        let checked = gate.check(&claims_for(&user.id)).await.unwrap();
        assert_eq!(checked.id, user.id);
    }

    #[tokio::test]
    async fn test_inactive_user_rejected_despite_valid_claims() {
        let store = Arc::new(StubIdentityStore::default());
        let user = store.insert_user("ext-1", "a@x.com", false);
        let gate = RevocationGate::new(store);

        let err = gate.check(&claims_for(&user.id)).await.unwrap_err();
        assert!(matches!(err, AuthError::AccountRevoked));
    }

    #[tokio::test]
    async fn test_unknown_user_rejected_with_same_error() {
        let store = Arc::new(StubIdentityStore::default());
        let gate = RevocationGate::new(store);

        let err = gate.check(&claims_for("no-such-user")).await.unwrap_err();
        assert!(matches!(err, AuthError::AccountRevoked));
    }
}
