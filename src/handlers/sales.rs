//! Sales API handlers

use axum::{
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use uuid::Uuid;

use crate::auth::Session;
use crate::controllers::SaleController;
use crate::controllers::sales::{SaleFormOptions, SalesList, SalesParams};
use crate::error::ApiError;
use crate::models::SaleDraft;
use crate::models::sale::SalePayload;
use crate::server::AppState;

/// List sales
///
/// The sales role only ever receives its own sales.
#[utoipa::path(
    get,
    path = "/api/sales",
    security(("bearer_auth" = [])),
    params(SalesParams),
    responses(
        (status = 200, description = "Sales, newest first, with their total", body = SalesList),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "sales"
)]
pub async fn list_sales(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<SalesParams>,
) -> Result<Json<SalesList>, ApiError> {
    let controller = SaleController::new(&session, &state.config);
    Ok(Json(controller.list(&params).await?))
}

/// Cars and customers for the sale form
#[utoipa::path(
    get,
    path = "/api/sales/options",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Unsold cars, customers and payment methods", body = SaleFormOptions)
    ),
    tag = "sales"
)]
pub async fn get_sale_options(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<SaleFormOptions>, ApiError> {
    let controller = SaleController::new(&session, &state.config);
    Ok(Json(controller.form_options().await?))
}

/// Record a sale
#[utoipa::path(
    post,
    path = "/api/sales",
    security(("bearer_auth" = [])),
    request_body = SaleDraft,
    responses(
        (status = 201, description = "Sale recorded", body = SalePayload),
        (status = 400, description = "Missing car or customer, or no positive price", body = ApiError)
    ),
    tag = "sales"
)]
pub async fn record_sale(
    State(state): State<AppState>,
    session: Session,
    payload: Result<Json<SaleDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<SalePayload>), ApiError> {
    let Json(draft) = payload?;
    let sale = SaleController::new(&session, &state.config)
        .record(draft)
        .await?;
    Ok((StatusCode::CREATED, Json(sale)))
}

/// Delete a sale (admin)
#[utoipa::path(
    delete,
    path = "/api/sales/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Sale id")),
    responses(
        (status = 204, description = "Sale deleted"),
        (status = 403, description = "Caller is not an admin", body = ApiError)
    ),
    tag = "sales"
)]
pub async fn delete_sale(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    SaleController::new(&session, &state.config)
        .delete(id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
