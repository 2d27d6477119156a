//! Permission grant management endpoints (admin-only).

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::AuthError;
use crate::identity::PermissionGrant;
use crate::middleware::AdminAuth;

use super::AuthHttpState;

/// Request body for creating a grant.
#[derive(Debug, Deserialize)]
pub struct GrantRequest {
    /// Permission name to grant.
    pub permission: String,

    /// Optional expiry (RFC 3339).
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub expires_at: Option<OffsetDateTime>,
}

/// Response body for grant operations.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantResponse {
    /// The targeted user.
    pub user_id: String,
    /// The permission in question.
    pub permission: String,
    /// Whether the operation changed anything.
    pub changed: bool,
}

/// `POST /admin/users/{id}/permissions`
///
/// Creates (or replaces) a grant for the target user. The grant records
/// the acting administrator.
pub async fn add_grant_handler(
    State(state): State<AuthHttpState>,
    AdminAuth(admin): AdminAuth,
    Path(user_id): Path<String>,
    Json(request): Json<GrantRequest>,
) -> Result<Json<GrantResponse>, AuthError> {
    let mut grant = PermissionGrant::new(&user_id, &request.permission).granted_by(admin.user_id());
    if let Some(expires) = request.expires_at {
        grant = grant.expires_at(expires);
    }

    state.identities.add_grant(&grant).await?;
    tracing::info!(
        target_user = %user_id,
        permission = %request.permission,
        admin = %admin.user_id(),
        "Permission granted"
    );

    Ok(Json(GrantResponse {
        user_id,
        permission: request.permission,
        changed: true,
    }))
}

/// `DELETE /admin/users/{id}/permissions/{name}`
///
/// Ends a grant by clearing its active flag.
pub async fn end_grant_handler(
    State(state): State<AuthHttpState>,
    AdminAuth(admin): AdminAuth,
    Path((user_id, permission)): Path<(String, String)>,
) -> Result<Json<GrantResponse>, AuthError> {
    let changed = state.identities.end_grant(&user_id, &permission).await?;
    if changed {
        tracing::info!(
            target_user = %user_id,
            permission = %permission,
            admin = %admin.user_id(),
            "Permission grant ended"
        );
    }

    Ok(Json(GrantResponse {
        user_id,
        permission,
        changed,
    }))
}
