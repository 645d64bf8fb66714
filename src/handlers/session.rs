//! Session endpoint: who is signed in and what they may do.

use axum::response::Json;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{Permissions, Session};
use crate::error::ApiError;
use crate::models::Role;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionInfo {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub role: Role,
    pub role_label: String,
    pub permissions: Permissions,
}

impl From<&Session> for SessionInfo {
    fn from(session: &Session) -> Self {
        Self {
            user_id: session.user.id,
            email: session.user.email.clone(),
            full_name: session.profile.full_name.clone(),
            role: session.role,
            role_label: session.role.label().to_string(),
            permissions: Permissions::for_role(session.role),
        }
    }
}

/// Resolve the caller's session
///
/// 401 for a missing or rejected token, 403 `ROLE_NOT_ASSIGNED` when the
/// account has no usable role.
#[utoipa::path(
    get,
    path = "/api/session",
    responses(
        (status = 200, description = "Signed-in user with role and permissions", body = SessionInfo),
        (status = 401, description = "Missing or invalid token", body = ApiError),
        (status = 403, description = "No role assigned", body = ApiError),
        (status = 503, description = "Backend not configured or not ready", body = ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "session"
)]
pub async fn get_session(session: Session) -> Result<Json<SessionInfo>, ApiError> {
    Ok(Json(SessionInfo::from(&session)))
}
