use reqwest::Method;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{BackendClient, BackendError};

/// The signed-in user as the auth service describes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: Option<String>,
}

impl BackendClient {
    /// Resolves the bearer token to its user. An invalid or expired token
    /// comes back as a 401/403 [`BackendError::Api`].
    pub async fn current_user(&self) -> Result<AuthUser, BackendError> {
        let response = self
            .send("auth:user", self.request(Method::GET, "auth/v1/user"))
            .await?;
        response
            .json()
            .await
            .map_err(|err| BackendError::schema("auth user", None, err.to_string()))
    }
}
