//! Current-user endpoint.

use axum::Json;
use serde::Serialize;

use crate::middleware::SessionAuth;

/// Profile fields exposed for the authenticated user.
///
/// The sealed provider token is never part of any response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfoResponse {
    /// Application user id.
    pub id: String,
    /// Current email.
    pub email: String,
    /// Display name, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Avatar URL, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// `GET /auth/me`
pub async fn userinfo_handler(SessionAuth(context): SessionAuth) -> Json<UserInfoResponse> {
    Json(UserInfoResponse {
        id: context.user.id.clone(),
        email: context.user.email.clone(),
        display_name: context.user.display_name.clone(),
        avatar_url: context.user.avatar_url.clone(),
    })
}
