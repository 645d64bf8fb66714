//! Configuration status endpoint
//!
//! Lets the UI decide between the login screen and the configuration-missing
//! page without holding a token.

use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::server::AppState;

/// Whether the backend connection settings are present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ConfigStatus {
    pub configured: bool,
    /// Names of the missing settings.
    pub missing: Vec<String>,
}

/// Get backend configuration status
///
/// Never exposes the values themselves.
#[utoipa::path(
    get,
    path = "/api/config",
    responses(
        (status = 200, description = "Backend configuration status", body = ConfigStatus)
    ),
    tag = "configuration"
)]
pub async fn get_config_status(State(state): State<AppState>) -> Json<ConfigStatus> {
    let mut missing = Vec::new();
    if state.config.backend_url.as_deref().is_none_or(str::is_empty) {
        missing.push("SHOWROOM_BACKEND_URL".to_string());
    }
    if state.config.backend_anon_key.as_deref().is_none_or(str::is_empty) {
        missing.push("SHOWROOM_BACKEND_ANON_KEY".to_string());
    }
    Json(ConfigStatus {
        configured: state.backend.is_some(),
        missing,
    })
}
