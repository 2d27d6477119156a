//! The canonical user record.
//!
//! Users are keyed by the stable identity the external provider
//! assigns (`external_id`). Email is a mutable profile field and must
//! never be used as a join key.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::secrets::SealedSecret;

/// A user known to the platform.
///
/// Created on the first successful callback exchange for an external
/// identity, updated on every later login, and soft-deactivated (never
/// deleted) on revocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier (UUID string).
    pub id: String,

    /// Stable identity assigned by the external provider. Unique.
    pub external_id: String,

    /// Email address. Unique, but mutable - display and contact only.
    pub email: String,

    /// Display name from the provider profile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Avatar URL from the provider profile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,

    /// Provider access token, sealed with AES-256-GCM. Never stored in
    /// plaintext and never exposed through the API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sealed_access_token: Option<SealedSecret>,

    /// Whether the account is active. Revocation clears this.
    pub active: bool,

    /// Last successful login.
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_login_at: Option<OffsetDateTime>,

    /// Last explicit logout.
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_logout_at: Option<OffsetDateTime>,

    /// When the account was revoked, if ever.
    #[serde(with = "time::serde::rfc3339::option")]
    pub revoked_at: Option<OffsetDateTime>,

    /// When the record was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    /// When the record was last updated.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl User {
    /// Creates a new active user for an external identity.
    #[must_use]
    pub fn new(external_id: impl Into<String>, email: impl Into<String>) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            external_id: external_id.into(),
            email: email.into(),
            display_name: None,
            avatar_url: None,
            sealed_access_token: None,
            active: true,
            last_login_at: None,
            last_logout_at: None,
            revoked_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns `true` if the account is active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Applies the mutable profile fields from a fresh provider profile.
    ///
    /// The external id never changes; email and display attributes
    /// follow whatever the provider currently reports.
    pub fn apply_profile(
        &mut self,
        email: impl Into<String>,
        display_name: Option<String>,
        avatar_url: Option<String>,
    ) {
        self.email = email.into();
        self.display_name = display_name;
        self.avatar_url = avatar_url;
        self.updated_at = OffsetDateTime::now_utc();
    }
}
