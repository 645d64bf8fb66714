//! Customers API handlers

use axum::{
    extract::{Path, Query, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use uuid::Uuid;

use super::SearchParams;
use crate::auth::Session;
use crate::controllers::CustomerController;
use crate::controllers::customers::CustomerList;
use crate::error::ApiError;
use crate::models::{Customer, CustomerDraft};

/// List customers
#[utoipa::path(
    get,
    path = "/api/customers",
    security(("bearer_auth" = [])),
    params(SearchParams),
    responses(
        (status = 200, description = "Customers, newest first", body = CustomerList),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "customers"
)]
pub async fn list_customers(
    session: Session,
    Query(params): Query<SearchParams>,
) -> Result<Json<CustomerList>, ApiError> {
    Ok(Json(CustomerController::new(&session).list(params.text()).await?))
}

/// Add a customer
#[utoipa::path(
    post,
    path = "/api/customers",
    security(("bearer_auth" = [])),
    request_body = CustomerDraft,
    responses(
        (status = 201, description = "Customer created", body = Customer),
        (status = 400, description = "Invalid draft", body = ApiError)
    ),
    tag = "customers"
)]
pub async fn create_customer(
    session: Session,
    payload: Result<Json<CustomerDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<Customer>), ApiError> {
    let Json(draft) = payload?;
    let customer = CustomerController::new(&session).create(draft).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

/// Edit a customer (admin)
#[utoipa::path(
    put,
    path = "/api/customers/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Customer id")),
    request_body = CustomerDraft,
    responses(
        (status = 200, description = "Customer updated", body = Customer),
        (status = 403, description = "Caller is not an admin", body = ApiError),
        (status = 404, description = "No such customer", body = ApiError)
    ),
    tag = "customers"
)]
pub async fn update_customer(
    session: Session,
    Path(id): Path<Uuid>,
    payload: Result<Json<CustomerDraft>, JsonRejection>,
) -> Result<Json<Customer>, ApiError> {
    let Json(draft) = payload?;
    Ok(Json(CustomerController::new(&session).update(id, draft).await?))
}

/// Delete a customer (admin)
#[utoipa::path(
    delete,
    path = "/api/customers/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Customer id")),
    responses(
        (status = 204, description = "Customer deleted"),
        (status = 403, description = "Caller is not an admin", body = ApiError)
    ),
    tag = "customers"
)]
pub async fn delete_customer(session: Session, Path(id): Path<Uuid>) -> Result<StatusCode, ApiError> {
    CustomerController::new(&session).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
