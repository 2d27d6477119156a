//! Identity storage trait.
//!
//! Defines the persistence interface for users and permission grants.
//! Implementations are provided by storage backends (e.g.
//! `parley-auth-memory`); all mutations to a given user must be atomic
//! per row.

use async_trait::async_trait;
use time::OffsetDateTime;

use super::permission::PermissionGrant;
use super::user::User;
use crate::AuthResult;

/// Storage operations for users and their permission grants.
///
/// Concurrent logins for the same external identity may race; last
/// writer wins. A revoke racing a login must resolve deterministically
/// by timestamp ordering at the store.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Finds a user by application id.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_id(&self, user_id: &str) -> AuthResult<Option<User>>;

    /// Finds a user by the provider-assigned external identity.
    ///
    /// This is the only stable join key - never look users up by email
    /// when resolving a login.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_external_id(&self, external_id: &str) -> AuthResult<Option<User>>;

    /// Creates a new user.
    ///
    /// # Errors
    ///
    /// Returns an error if a user with the same external id or email
    /// already exists, or the storage operation fails.
    async fn create(&self, user: &User) -> AuthResult<()>;

    /// Updates an existing user.
    ///
    /// # Errors
    ///
    /// Returns an error if the user does not exist or the storage
    /// operation fails.
    async fn update(&self, user: &User) -> AuthResult<()>;

    /// Records a successful login.
    ///
    /// # Errors
    ///
    /// Returns an error if the user does not exist or the storage
    /// operation fails.
    async fn record_login(&self, user_id: &str, at: OffsetDateTime) -> AuthResult<()>;

    /// Records an explicit logout.
    ///
    /// # Errors
    ///
    /// Returns an error if the user does not exist or the storage
    /// operation fails.
    async fn record_logout(&self, user_id: &str, at: OffsetDateTime) -> AuthResult<()>;

    /// Soft-deactivates a user: clears `active` and stamps `revoked_at`.
    ///
    /// Returns `false` when the user is unknown or already inactive.
    /// The record is never deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn deactivate(&self, user_id: &str, at: OffsetDateTime) -> AuthResult<bool>;

    /// Loads all grants for a user, effective or not.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn grants_for(&self, user_id: &str) -> AuthResult<Vec<PermissionGrant>>;

    /// Adds a grant. Replaces an existing grant with the same
    /// `(user_id, name)` pair.
    ///
    /// # Errors
    ///
    /// Returns an error if the user does not exist or the storage
    /// operation fails.
    async fn add_grant(&self, grant: &PermissionGrant) -> AuthResult<()>;

    /// Ends a grant by clearing its `active` flag.
    ///
    /// Returns `false` if no matching grant exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn end_grant(&self, user_id: &str, name: &str) -> AuthResult<bool>;
}
