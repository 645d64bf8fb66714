//! Dashboard API handler

use axum::{extract::State, response::Json};

use crate::auth::Session;
use crate::controllers::DashboardController;
use crate::controllers::dashboard::Dashboard;
use crate::error::ApiError;
use crate::server::AppState;

/// KPI cards and recent sales for the signed-in user
#[utoipa::path(
    get,
    path = "/api/dashboard",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Dashboard for the caller's role", body = Dashboard),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 503, description = "Database not ready", body = ApiError)
    ),
    tag = "dashboard"
)]
pub async fn get_dashboard(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Dashboard>, ApiError> {
    let dashboard = DashboardController::new(&session, &state.config)
        .load()
        .await?;
    Ok(Json(dashboard))
}
