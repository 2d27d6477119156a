//! Permission grants.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// The distinguished permission that implies every other permission.
pub const ADMIN_PERMISSION: &str = "admin";

/// A named permission granted to a user.
///
/// The `(user_id, name)` pair is unique. A grant is created by an
/// administrative action and ended either by clearing `active` or by
/// reaching `expires_at`; it is never otherwise mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionGrant {
    /// The user holding the grant.
    pub user_id: String,

    /// Permission name (e.g. `broadcast`, `admin`).
    pub name: String,

    /// When the grant was created.
    #[serde(with = "time::serde::rfc3339")]
    pub granted_at: OffsetDateTime,

    /// Who created the grant, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub granted_by: Option<String>,

    /// Optional expiry; a grant with no expiry lasts until ended.
    #[serde(with = "time::serde::rfc3339::option")]
    pub expires_at: Option<OffsetDateTime>,

    /// Whether the grant is still active.
    pub active: bool,
}

impl PermissionGrant {
    /// Creates a new active grant.
    #[must_use]
    pub fn new(user_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            name: name.into(),
            granted_at: OffsetDateTime::now_utc(),
            granted_by: None,
            expires_at: None,
            active: true,
        }
    }

    /// Sets who created the grant.
    #[must_use]
    pub fn granted_by(mut self, admin_id: impl Into<String>) -> Self {
        self.granted_by = Some(admin_id.into());
        self
    }

    /// Sets the expiry.
    #[must_use]
    pub fn expires_at(mut self, at: OffsetDateTime) -> Self {
        self.expires_at = Some(at);
        self
    }

    /// Returns `true` if the grant is effective at `now`: active and
    /// either unexpiring or not yet expired.
    #[must_use]
    pub fn is_effective(&self, now: OffsetDateTime) -> bool {
        self.active && self.expires_at.is_none_or(|exp| exp > now)
    }
}

#[cfg(test)]
mod tests {
    use time::Duration;

    use super::*;

    #[test]
    fn test_grant_without_expiry_is_effective() {
        let grant = PermissionGrant::new("user-1", "broadcast");
        assert!(grant.is_effective(OffsetDateTime::now_utc()));
    }

    #[test]
    fn test_expired_grant_is_not_effective() {
        let now = OffsetDateTime::now_utc();
        let grant = PermissionGrant::new("user-1", "broadcast").expires_at(now - Duration::hours(1));
        assert!(!grant.is_effective(now));
    }

    #[test]
    fn test_future_expiry_is_effective() {
        let now = OffsetDateTime::now_utc();
        let grant = PermissionGrant::new("user-1", "broadcast").expires_at(now + Duration::hours(1));
        assert!(grant.is_effective(now));
    }

    #[test]
    fn test_ended_grant_is_not_effective() {
        let mut grant = PermissionGrant::new("user-1", "broadcast");
        grant.active = false;
        assert!(!grant.is_effective(OffsetDateTime::now_utc()));
    }
}
