//! # API Handlers
//!
//! HTTP endpoints of the showroom back office. Everything under `/api`
//! except `/api/config` needs a bearer token; the handlers resolve it into
//! a [`Session`](crate::auth::Session) and delegate to the page controllers.

use axum::{
    extract::{Request, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::{ApiError, not_found};
use crate::models::ServiceInfo;
use crate::server::AppState;

pub mod cars;
pub mod config;
pub mod customers;
pub mod dashboard;
pub mod sales;
pub mod session;
pub mod spa;
pub mod suppliers;

/// Free-text search on a list page.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// Case-insensitive substring matched against the page's search columns
    pub q: Option<String>,
}

impl SearchParams {
    pub fn text(&self) -> &str {
        self.q.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthStatus {
    pub status: String,
    pub backend_configured: bool,
}

/// Root handler that returns basic service information
#[utoipa::path(
    get,
    path = "/api",
    responses(
        (status = 200, description = "Service information", body = ServiceInfo)
    ),
    tag = "root"
)]
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo::default())
}

/// Liveness probe. Answers even when the backend is not configured.
#[utoipa::path(
    get,
    path = "/healthz",
    responses(
        (status = 200, description = "Process is up", body = HealthStatus)
    ),
    tag = "root"
)]
pub async fn healthz(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
        backend_configured: state.backend.is_some(),
    })
}

/// Unknown `/api` paths are JSON 404s rather than the UI shell.
pub async fn api_not_found(request: Request) -> ApiError {
    tracing::debug!(path = %request.uri().path(), "Unknown API route");
    not_found("Route")
}
