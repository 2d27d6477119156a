//! Authenticated request context.

use std::sync::Arc;

use crate::identity::User;
use crate::token::SessionTokenClaims;

/// Context extracted from an authenticated request.
///
/// Both the verified claims and the live user record are available:
/// the claims identify the session, the record reflects current
/// account state (the revocation gate has already passed).
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Verified session token claims.
    pub claims: Arc<SessionTokenClaims>,

    /// The live user record loaded by the revocation gate.
    pub user: User,
}

impl AuthContext {
    /// Returns the authenticated user's id.
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user.id
    }

    /// Returns the authenticated user's current email.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.user.email
    }
}
