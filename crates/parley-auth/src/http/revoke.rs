//! Account revocation endpoint (admin-only).

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::audit::{AuthAction, AuthEvent, record_event};
use crate::error::AuthError;
use crate::middleware::AdminAuth;

use super::AuthHttpState;

/// Request body for a revocation.
#[derive(Debug, Default, Deserialize)]
pub struct RevokeRequest {
    /// Optional reason recorded in the audit trail.
    pub reason: Option<String>,
}

/// Response body for a revocation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevokeResponse {
    /// The targeted user.
    pub user_id: String,
    /// `false` when the account was already inactive or unknown.
    pub revoked: bool,
}

/// `POST /admin/users/{id}/revoke`
///
/// Soft-deactivates the target account. From this moment every request
/// bearing one of the account's still-valid session tokens fails at the
/// revocation gate. Always produces an audit entry, whether or not the
/// account was active.
pub async fn revoke_handler(
    State(state): State<AuthHttpState>,
    AdminAuth(admin): AdminAuth,
    Path(user_id): Path<String>,
    body: Option<Json<RevokeRequest>>,
) -> Result<Json<RevokeResponse>, AuthError> {
    let Json(request) = body.unwrap_or_default();
    let revoked = state
        .identities
        .deactivate(&user_id, OffsetDateTime::now_utc())
        .await?;

    let mut event = if revoked {
        AuthEvent::success(AuthAction::Revoke, user_id.clone())
    } else {
        AuthEvent::failure(AuthAction::Revoke, Some(user_id.clone()))
    };
    event = event.with_detail("revoked_by", admin.user_id());
    if let Some(reason) = &request.reason {
        event = event.with_detail("reason", reason.clone());
    }
    record_event(state.audit.as_ref(), event).await;

    if revoked {
        tracing::info!(target_user = %user_id, admin = %admin.user_id(), "Account revoked");
    }

    Ok(Json(RevokeResponse { user_id, revoked }))
}
