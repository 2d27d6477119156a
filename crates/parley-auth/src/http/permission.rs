//! Permission check endpoint.

use axum::{
    Json,
    extract::State,
};
use serde::{Deserialize, Serialize};

use crate::error::AuthError;
use crate::middleware::SessionAuth;

use super::AuthHttpState;

/// Request body for a permission check.
#[derive(Debug, Deserialize)]
pub struct PermissionCheckRequest {
    /// The permission name to evaluate.
    pub permission: String,
}

/// Response body for a permission check.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionCheckResponse {
    /// The permission that was evaluated.
    pub permission: String,
    /// Whether the authenticated user holds it.
    pub has_permission: bool,
}

/// `POST /auth/permissions/check`
///
/// Requires a valid session; the decision itself is returned rather
/// than enforced, so a `false` answer is a 200, not an error.
pub async fn permission_check_handler(
    State(state): State<AuthHttpState>,
    SessionAuth(context): SessionAuth,
    Json(request): Json<PermissionCheckRequest>,
) -> Result<Json<PermissionCheckResponse>, AuthError> {
    let has_permission = state
        .auth
        .permissions
        .has_permission(context.user_id(), &request.permission)
        .await?;

    Ok(Json(PermissionCheckResponse {
        permission: request.permission,
        has_permission,
    }))
}
