//! Login initiation endpoint.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use crate::error::AuthError;
use crate::oauth::LoginRequest;

use super::AuthHttpState;

/// Optional query parameters for login initiation.
#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    /// Caller-supplied state value; one is generated when absent.
    pub state: Option<String>,
}

/// `GET /auth/login`
///
/// Returns the provider authorize URL and the registered state value.
pub async fn login_handler(
    State(state): State<AuthHttpState>,
    Query(query): Query<LoginQuery>,
) -> Result<Json<LoginRequest>, AuthError> {
    let request = state.login.build(query.state).await?;
    Ok(Json(request))
}
