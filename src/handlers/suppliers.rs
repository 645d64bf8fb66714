//! Suppliers API handlers (admin only)

use axum::{
    extract::{Path, Query, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use uuid::Uuid;

use super::SearchParams;
use crate::auth::Session;
use crate::controllers::SupplierController;
use crate::controllers::suppliers::SupplierList;
use crate::error::ApiError;
use crate::models::{Supplier, SupplierDraft};

#[utoipa::path(
    get,
    path = "/api/suppliers",
    security(("bearer_auth" = [])),
    params(SearchParams),
    responses(
        (status = 200, description = "Suppliers, newest first", body = SupplierList),
        (status = 403, description = "Caller is not an admin", body = ApiError)
    ),
    tag = "suppliers"
)]
pub async fn list_suppliers(
    session: Session,
    Query(params): Query<SearchParams>,
) -> Result<Json<SupplierList>, ApiError> {
    let controller = SupplierController::new(&session)?;
    Ok(Json(controller.list(params.text()).await?))
}

#[utoipa::path(
    post,
    path = "/api/suppliers",
    security(("bearer_auth" = [])),
    request_body = SupplierDraft,
    responses(
        (status = 201, description = "Supplier created", body = Supplier),
        (status = 400, description = "Invalid draft", body = ApiError),
        (status = 403, description = "Caller is not an admin", body = ApiError)
    ),
    tag = "suppliers"
)]
pub async fn create_supplier(
    session: Session,
    payload: Result<Json<SupplierDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<Supplier>), ApiError> {
    let controller = SupplierController::new(&session)?;
    let Json(draft) = payload?;
    Ok((StatusCode::CREATED, Json(controller.create(draft).await?)))
}

#[utoipa::path(
    put,
    path = "/api/suppliers/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Supplier id")),
    request_body = SupplierDraft,
    responses(
        (status = 200, description = "Supplier updated", body = Supplier),
        (status = 403, description = "Caller is not an admin", body = ApiError),
        (status = 404, description = "No such supplier", body = ApiError)
    ),
    tag = "suppliers"
)]
pub async fn update_supplier(
    session: Session,
    Path(id): Path<Uuid>,
    payload: Result<Json<SupplierDraft>, JsonRejection>,
) -> Result<Json<Supplier>, ApiError> {
    let controller = SupplierController::new(&session)?;
    let Json(draft) = payload?;
    Ok(Json(controller.update(id, draft).await?))
}

#[utoipa::path(
    delete,
    path = "/api/suppliers/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Supplier id")),
    responses(
        (status = 204, description = "Supplier deleted"),
        (status = 403, description = "Caller is not an admin", body = ApiError)
    ),
    tag = "suppliers"
)]
pub async fn delete_supplier(session: Session, Path(id): Path<Uuid>) -> Result<StatusCode, ApiError> {
    SupplierController::new(&session)?.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
