//! CSRF state values for the login redirect round trip.
//!
//! A state value binds one in-flight authorization request to its
//! callback. Values are 256-bit random strings registered with a short
//! TTL and consumed exactly once: the store's `consume` is an atomic
//! check-and-invalidate, so two concurrent callbacks bearing the same
//! state cannot both succeed.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;

use crate::AuthResult;

/// Generates a fresh unguessable state value (256 bits, base64url).
#[must_use]
pub fn generate_state() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Storage for in-flight state values.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Registers a state value with the given time-to-live.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn register(&self, state: &str, ttl: Duration) -> AuthResult<()>;

    /// Atomically consumes a state value.
    ///
    /// Returns `true` exactly once per registered, unexpired value;
    /// every later call (and any call for an unknown or expired value)
    /// returns `false`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn consume(&self, state: &str) -> AuthResult<bool>;
}
