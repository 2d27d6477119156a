//! In-memory identity store.

use async_trait::async_trait;
use dashmap::DashMap;
use time::OffsetDateTime;

use parley_auth::error::AuthError;
use parley_auth::identity::{IdentityStore, PermissionGrant, User};
use parley_auth::AuthResult;

/// In-memory [`IdentityStore`].
///
/// Users are keyed by id with a secondary index on the external id.
/// Mutations go through `DashMap` entries, which lock per key - the
/// per-row atomicity the trait requires.
///
/// Revocation is sticky: once a record carries `revoked_at`, a
/// concurrent login writing the whole row back cannot resurrect the
/// account. That resolves the revoke-vs-login race deterministically in
/// favor of the revocation.
#[derive(Default)]
pub struct InMemoryIdentityStore {
    users: DashMap<String, User>,
    external_index: DashMap<String, String>,
    grants: DashMap<String, Vec<PermissionGrant>>,
}

impl InMemoryIdentityStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of users in the store.
    #[must_use]
    pub fn user_count(&self) -> usize {
        self.users.len()
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn find_by_id(&self, user_id: &str) -> AuthResult<Option<User>> {
        Ok(self.users.get(user_id).map(|u| u.value().clone()))
    }

    async fn find_by_external_id(&self, external_id: &str) -> AuthResult<Option<User>> {
        let Some(id) = self.external_index.get(external_id).map(|e| e.value().clone()) else {
            return Ok(None);
        };
        Ok(self.users.get(&id).map(|u| u.value().clone()))
    }

    async fn create(&self, user: &User) -> AuthResult<()> {
        if self.external_index.contains_key(&user.external_id) {
            return Err(AuthError::storage(format!(
                "User with external id {} already exists",
                user.external_id
            )));
        }
        if self.users.iter().any(|u| u.email == user.email) {
            return Err(AuthError::storage(format!(
                "User with email {} already exists",
                user.email
            )));
        }
        self.external_index
            .insert(user.external_id.clone(), user.id.clone());
        self.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn update(&self, user: &User) -> AuthResult<()> {
        let Some(mut entry) = self.users.get_mut(&user.id) else {
            return Err(AuthError::storage(format!("Unknown user {}", user.id)));
        };

        let mut incoming = user.clone();
        // Revocation is sticky: a write that lost the race against a
        // revoke keeps the revoked state.
        if let Some(revoked_at) = entry.revoked_at
            && incoming.revoked_at.is_none()
        {
            incoming.active = false;
            incoming.revoked_at = Some(revoked_at);
        }
        *entry = incoming;
        Ok(())
    }

    async fn record_login(&self, user_id: &str, at: OffsetDateTime) -> AuthResult<()> {
        let Some(mut entry) = self.users.get_mut(user_id) else {
            return Err(AuthError::storage(format!("Unknown user {user_id}")));
        };
        entry.last_login_at = Some(at);
        entry.updated_at = at;
        Ok(())
    }

    async fn record_logout(&self, user_id: &str, at: OffsetDateTime) -> AuthResult<()> {
        let Some(mut entry) = self.users.get_mut(user_id) else {
            return Err(AuthError::storage(format!("Unknown user {user_id}")));
        };
        entry.last_logout_at = Some(at);
        entry.updated_at = at;
        Ok(())
    }

    async fn deactivate(&self, user_id: &str, at: OffsetDateTime) -> AuthResult<bool> {
        let Some(mut entry) = self.users.get_mut(user_id) else {
            return Ok(false);
        };
        let was_active = entry.active;
        entry.active = false;
        entry.revoked_at = Some(at);
        entry.updated_at = at;
        Ok(was_active)
    }

    async fn grants_for(&self, user_id: &str) -> AuthResult<Vec<PermissionGrant>> {
        Ok(self
            .grants
            .get(user_id)
            .map(|g| g.value().clone())
            .unwrap_or_default())
    }

    async fn add_grant(&self, grant: &PermissionGrant) -> AuthResult<()> {
        if !self.users.contains_key(&grant.user_id) {
            return Err(AuthError::storage(format!(
                "Unknown user {}",
                grant.user_id
            )));
        }
        let mut grants = self.grants.entry(grant.user_id.clone()).or_default();
        // (user_id, name) is unique: a re-grant replaces the old grant.
        grants.retain(|g| g.name != grant.name);
        grants.push(grant.clone());
        Ok(())
    }

    async fn end_grant(&self, user_id: &str, name: &str) -> AuthResult<bool> {
        let Some(mut grants) = self.grants.get_mut(user_id) else {
            return Ok(false);
        };
        let mut ended = false;
        for grant in grants.iter_mut().filter(|g| g.name == name && g.active) {
            grant.active = false;
            ended = true;
        }
        Ok(ended)
    }
}
