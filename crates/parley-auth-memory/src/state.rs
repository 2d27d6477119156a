//! In-memory CSRF state store.

use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use time::OffsetDateTime;

use parley_auth::AuthResult;
use parley_auth::oauth::StateStore;

/// In-memory [`StateStore`].
///
/// `consume` is backed by `DashMap::remove`, which extracts the entry
/// atomically - of two concurrent consumers of the same value, exactly
/// one sees it.
#[derive(Default)]
pub struct InMemoryStateStore {
    /// state value -> expiry instant
    states: DashMap<String, OffsetDateTime>,
}

impl InMemoryStateStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered (possibly expired) values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Returns `true` if no values are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn register(&self, state: &str, ttl: Duration) -> AuthResult<()> {
        let expires_at = OffsetDateTime::now_utc() + ttl;
        self.states.insert(state.to_string(), expires_at);
        Ok(())
    }

    async fn consume(&self, state: &str) -> AuthResult<bool> {
        match self.states.remove(state) {
            Some((_, expires_at)) => Ok(expires_at > OffsetDateTime::now_utc()),
            None => Ok(false),
        }
    }
}
