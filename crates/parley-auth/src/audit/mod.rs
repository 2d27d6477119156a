//! Security event audit logging.
//!
//! One event is recorded per login (success and failure), logout,
//! refresh, and revoke. Events are append-only; a sink failure is
//! logged and never fails the request that produced the event.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use time::OffsetDateTime;

use crate::AuthResult;

/// Auth actions that produce an audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthAction {
    /// A callback exchange completed (successfully or not).
    Login,
    /// An authenticated user logged out.
    Logout,
    /// A session token was re-minted for an active user.
    Refresh,
    /// An administrator deactivated an account.
    Revoke,
}

impl AuthAction {
    /// Returns the action name as recorded.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Logout => "logout",
            Self::Refresh => "refresh",
            Self::Revoke => "revoke",
        }
    }
}

/// An immutable audit record.
///
/// Written once, never updated. `user_id` is absent for failed attempts
/// that never resolved an identity. Detail metadata never contains raw
/// tokens or secrets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthEvent {
    /// Unique event id.
    pub id: String,

    /// The user the event concerns, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    /// What happened.
    pub action: AuthAction,

    /// Whether the action succeeded.
    pub success: bool,

    /// Contextual metadata (reason codes, provider hints).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub detail: BTreeMap<String, Value>,

    /// When the event was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl AuthEvent {
    /// Creates a successful event for a known user.
    #[must_use]
    pub fn success(action: AuthAction, user_id: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: Some(user_id.into()),
            action,
            success: true,
            detail: BTreeMap::new(),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    /// Creates a failed event; the user may be unknown.
    #[must_use]
    pub fn failure(action: AuthAction, user_id: Option<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            action,
            success: false,
            detail: BTreeMap::new(),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    /// Attaches a metadata entry.
    #[must_use]
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.detail.insert(key.into(), value.into());
        self
    }
}

/// Destination for audit events.
///
/// The sink is an external collaborator at this subsystem's boundary;
/// implementations forward events to whatever the deployment uses
/// (database table, log pipeline).
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Records one event.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink cannot accept the event. Callers
    /// log the failure and continue - auditing never fails a request.
    async fn record(&self, event: AuthEvent) -> AuthResult<()>;
}

/// Records an event on a sink, logging (but swallowing) sink failures.
pub async fn record_event(sink: &dyn AuditSink, event: AuthEvent) {
    let action = event.action;
    if let Err(e) = sink.record(event).await {
        tracing::warn!(action = action.as_str(), error = %e, "Failed to record audit event");
    }
}

/// Audit sink that emits events as structured tracing records.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, event: AuthEvent) -> AuthResult<()> {
        tracing::info!(
            target: "parley::audit",
            action = event.action.as_str(),
            success = event.success,
            user_id = event.user_id.as_deref().unwrap_or("-"),
            detail = %serde_json::to_string(&event.detail).unwrap_or_default(),
            "auth event"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_names() {
        assert_eq!(AuthAction::Login.as_str(), "login");
        assert_eq!(AuthAction::Logout.as_str(), "logout");
        assert_eq!(AuthAction::Refresh.as_str(), "refresh");
        assert_eq!(AuthAction::Revoke.as_str(), "revoke");
    }

    #[test]
    fn test_success_event() {
        let event = AuthEvent::success(AuthAction::Login, "user-1")
            .with_detail("provider", "microsoft");
        assert!(event.success);
        assert_eq!(event.user_id.as_deref(), Some("user-1"));
        assert_eq!(event.detail["provider"], "microsoft");
    }

    #[test]
    fn test_failure_event_without_user() {
        let event = AuthEvent::failure(AuthAction::Login, None).with_detail("reason", "bad_state");
        assert!(!event.success);
        assert!(event.user_id.is_none());
    }

    #[test]
    fn test_event_serialization() {
        let event = AuthEvent::success(AuthAction::Revoke, "user-1");
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"action\":\"revoke\""));
        assert!(json.contains("\"success\":true"));
        // Empty detail maps are omitted.
        assert!(!json.contains("detail"));
    }

    #[tokio::test]
    async fn test_tracing_sink_accepts_events() {
        let sink = TracingAuditSink;
        sink.record(AuthEvent::success(AuthAction::Logout, "user-1"))
            .await
            .unwrap();
    }
}
