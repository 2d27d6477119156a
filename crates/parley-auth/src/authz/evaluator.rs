//! Permission evaluation.

use std::sync::Arc;

use time::OffsetDateTime;

use crate::AuthResult;
use crate::identity::IdentityStore;
use crate::identity::permission::ADMIN_PERMISSION;

/// Decides whether a user holds a named permission.
///
/// The distinguished `admin` grant satisfies every permission name: it
/// is an implicit superset, not a separate code path - the revocation
/// gate has always run before evaluation.
pub struct PermissionEvaluator {
    identities: Arc<dyn IdentityStore>,
}

impl PermissionEvaluator {
    /// Creates a new evaluator.
    #[must_use]
    pub fn new(identities: Arc<dyn IdentityStore>) -> Self {
        Self { identities }
    }

    /// Returns `true` if the user holds an effective grant for
    /// `permission`, directly or through `admin`.
    ///
    /// An unknown user or a missing grant is `Ok(false)`, not an error;
    /// only store I/O failure surfaces as `Err`.
    ///
    /// # Errors
    ///
    /// Returns an error if the grant lookup fails.
    pub async fn has_permission(&self, user_id: &str, permission: &str) -> AuthResult<bool> {
        let grants = self.identities.grants_for(user_id).await?;
        let now = OffsetDateTime::now_utc();

        let decision = grants.iter().any(|grant| {
            grant.is_effective(now) && (grant.name == permission || grant.name == ADMIN_PERMISSION)
        });

        tracing::debug!(
            user_id,
            permission,
            granted = decision,
            "Evaluated permission"
        );

        Ok(decision)
    }

    /// Returns `true` if the user holds the `admin` permission.
    ///
    /// # Errors
    ///
    /// Returns an error if the grant lookup fails.
    pub async fn is_admin(&self, user_id: &str) -> AuthResult<bool> {
        self.has_permission(user_id, ADMIN_PERMISSION).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use time::Duration;

    use super::*;
    use crate::identity::{PermissionGrant, User};

    /// Minimal in-process store for unit tests of the authorization
    /// layer. The full-featured implementation lives in
    /// `parley-auth-memory`.
    #[derive(Default)]
    pub(crate) struct StubIdentityStore {
        users: Mutex<HashMap<String, User>>,
        grants: Mutex<HashMap<String, Vec<PermissionGrant>>>,
    }

    impl StubIdentityStore {
        pub(crate) fn insert_user(&self, external_id: &str, email: &str, active: bool) -> User {
            let mut user = User::new(external_id, email);
            user.active = active;
            self.users
                .lock()
                .unwrap()
                .insert(user.id.clone(), user.clone());
            user
        }

        pub(crate) fn insert_grant(&self, grant: PermissionGrant) {
            self.grants
                .lock()
                .unwrap()
                .entry(grant.user_id.clone())
                .or_default()
                .push(grant);
        }
    }

    #[async_trait]
    impl IdentityStore for StubIdentityStore {
        async fn find_by_id(&self, user_id: &str) -> AuthResult<Option<User>> {
            Ok(self.users.lock().unwrap().get(user_id).cloned())
        }

        async fn find_by_external_id(&self, external_id: &str) -> AuthResult<Option<User>> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .values()
                .find(|u| u.external_id == external_id)
                .cloned())
        }

        async fn create(&self, user: &User) -> AuthResult<()> {
            self.users
                .lock()
                .unwrap()
                .insert(user.id.clone(), user.clone());
            Ok(())
        }

        async fn update(&self, user: &User) -> AuthResult<()> {
            self.users
                .lock()
                .unwrap()
                .insert(user.id.clone(), user.clone());
            Ok(())
        }

        async fn record_login(&self, user_id: &str, at: OffsetDateTime) -> AuthResult<()> {
            if let Some(user) = self.users.lock().unwrap().get_mut(user_id) {
                user.last_login_at = Some(at);
            }
            Ok(())
        }

        async fn record_logout(&self, user_id: &str, at: OffsetDateTime) -> AuthResult<()> {
            if let Some(user) = self.users.lock().unwrap().get_mut(user_id) {
                user.last_logout_at = Some(at);
            }
            Ok(())
        }

        async fn deactivate(&self, user_id: &str, at: OffsetDateTime) -> AuthResult<bool> {
            if let Some(user) = self.users.lock().unwrap().get_mut(user_id) {
                let was_active = user.active;
                user.active = false;
                user.revoked_at = Some(at);
                return Ok(was_active);
            }
            Ok(false)
        }

        async fn grants_for(&self, user_id: &str) -> AuthResult<Vec<PermissionGrant>> {
            Ok(self
                .grants
                .lock()
                .unwrap()
                .get(user_id)
                .cloned()
                .unwrap_or_default())
        }

        async fn add_grant(&self, grant: &PermissionGrant) -> AuthResult<()> {
            self.insert_grant(grant.clone());
            Ok(())
        }

        async fn end_grant(&self, user_id: &str, name: &str) -> AuthResult<bool> {
            let mut grants = self.grants.lock().unwrap();
            if let Some(list) = grants.get_mut(user_id) {
                for grant in list.iter_mut().filter(|g| g.name == name && g.active) {
                    grant.active = false;
                    return Ok(true);
                }
            }
            Ok(false)
        }
    }

    fn evaluator_with(store: Arc<StubIdentityStore>) -> PermissionEvaluator {
        PermissionEvaluator::new(store)
    }

    #[tokio::test]
    async fn test_direct_grant_is_honored() {
        let store = Arc::new(StubIdentityStore::default());
        let user = store.insert_user("ext-1", "a@x.com", true);
        store.insert_grant(PermissionGrant::new(&user.id, "broadcast"));

        let evaluator = evaluator_with(store);
        assert!(evaluator.has_permission(&user.id, "broadcast").await.unwrap());
        assert!(!evaluator.has_permission(&user.id, "configure").await.unwrap());
    }

    #[tokio::test]
    async fn test_expired_grant_evaluates_false() {
        let store = Arc::new(StubIdentityStore::default());
        let user = store.insert_user("ext-1", "a@x.com", true);
        store.insert_grant(
            PermissionGrant::new(&user.id, "broadcast")
                .expires_at(OffsetDateTime::now_utc() - Duration::hours(1)),
        );

        let evaluator = evaluator_with(store);
        assert!(!evaluator.has_permission(&user.id, "broadcast").await.unwrap());
    }

    #[tokio::test]
    async fn test_future_expiry_evaluates_true() {
        let store = Arc::new(StubIdentityStore::default());
        let user = store.insert_user("ext-1", "a@x.com", true);
        store.insert_grant(
            PermissionGrant::new(&user.id, "broadcast")
                .expires_at(OffsetDateTime::now_utc() + Duration::hours(1)),
        );

        let evaluator = evaluator_with(store);
        assert!(evaluator.has_permission(&user.id, "broadcast").await.unwrap());
    }

    #[tokio::test]
    async fn test_admin_grant_satisfies_every_permission() {
        let store = Arc::new(StubIdentityStore::default());
        let user = store.insert_user("ext-1", "a@x.com", true);
        store.insert_grant(PermissionGrant::new(&user.id, ADMIN_PERMISSION));

        let evaluator = evaluator_with(store);
        assert!(evaluator.has_permission(&user.id, "broadcast").await.unwrap());
        assert!(evaluator.has_permission(&user.id, "configure").await.unwrap());
        assert!(evaluator.has_permission(&user.id, "anything-at-all").await.unwrap());
        assert!(evaluator.is_admin(&user.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_unknown_user_is_false_not_error() {
        let store = Arc::new(StubIdentityStore::default());
        let evaluator = evaluator_with(store);
        assert!(!evaluator.has_permission("ghost", "broadcast").await.unwrap());
    }
}
