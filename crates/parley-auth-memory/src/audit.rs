//! In-memory audit sink.

use std::sync::Mutex;

use async_trait::async_trait;

use parley_auth::AuthResult;
use parley_auth::audit::{AuditSink, AuthEvent};

/// Audit sink that retains events in memory.
///
/// Used by tests to assert on the audit trail and by single-node
/// deployments that scrape it elsewhere.
#[derive(Default)]
pub struct InMemoryAuditSink {
    events: Mutex<Vec<AuthEvent>>,
}

impl InMemoryAuditSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all recorded events, oldest first.
    #[must_use]
    pub fn recorded(&self) -> Vec<AuthEvent> {
        self.events.lock().expect("audit sink poisoned").clone()
    }
}

#[async_trait]
impl AuditSink for InMemoryAuditSink {
    async fn record(&self, event: AuthEvent) -> AuthResult<()> {
        self.events.lock().expect("audit sink poisoned").push(event);
        Ok(())
    }
}
