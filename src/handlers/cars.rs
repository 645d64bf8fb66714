//! # Cars API Handlers
//!
//! Inventory listing with filters, the car details view and the admin car form.

use axum::{
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::Session;
use crate::controllers::cars::{Catalog, CarView, Inventory};
use crate::controllers::{CarController, Saved};
use crate::error::ApiError;
use crate::filters::{InventoryFilter, InventoryParams};
use crate::models::CarDraft;
use crate::models::car::{CAR_TYPES, CarCard};
use crate::models::supplier::SupplierOption;
use crate::server::AppState;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PriceCeiling {
    /// Upper end of the price slider.
    pub ceiling: f64,
    pub step: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CatalogResponse {
    /// Make -> sorted model names.
    pub makes: Catalog,
    pub car_types: Vec<String>,
}

/// List inventory
///
/// Filters combine with AND. A supplier filter with no cars returns an
/// empty list without querying the inventory.
#[utoipa::path(
    get,
    path = "/api/cars",
    security(("bearer_auth" = [])),
    params(InventoryParams),
    responses(
        (status = 200, description = "Matching cars, newest first by default", body = Inventory),
        (status = 400, description = "Malformed filter value", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 502, description = "Backend error", body = ApiError)
    ),
    tag = "cars"
)]
pub async fn list_cars(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<InventoryParams>,
) -> Result<Json<Inventory>, ApiError> {
    let controller = CarController::new(&session, &state.config);
    let ceiling = controller.price_ceiling().await?;
    let filter = InventoryFilter::from_params(&params, ceiling)?;
    Ok(Json(controller.list(filter).await?))
}

/// Price slider domain
#[utoipa::path(
    get,
    path = "/api/cars/price-ceiling",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Highest asking price rounded up to the step", body = PriceCeiling),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "cars"
)]
pub async fn get_price_ceiling(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<PriceCeiling>, ApiError> {
    let ceiling = CarController::new(&session, &state.config)
        .price_ceiling()
        .await?;
    Ok(Json(PriceCeiling {
        ceiling,
        step: state.config.price_step,
    }))
}

/// Make/model catalog for the car form
#[utoipa::path(
    get,
    path = "/api/cars/catalog",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Built-in, saved and in-stock makes and models", body = CatalogResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "cars"
)]
pub async fn get_catalog(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<CatalogResponse>, ApiError> {
    let makes = CarController::new(&session, &state.config).catalog().await?;
    Ok(Json(CatalogResponse {
        makes,
        car_types: CAR_TYPES.iter().map(|t| t.to_string()).collect(),
    }))
}

/// Supplier picker for the car form (admin)
#[utoipa::path(
    get,
    path = "/api/cars/suppliers",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Suppliers ordered by company", body = [SupplierOption]),
        (status = 403, description = "Caller is not an admin", body = ApiError)
    ),
    tag = "cars"
)]
pub async fn list_supplier_options(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<SupplierOption>>, ApiError> {
    let options = CarController::new(&session, &state.config)
        .supplier_options()
        .await?;
    Ok(Json(options))
}

/// Car details
///
/// Finance is complete for admins and limited to the supplier for sales.
/// Companion rows that fail to load are reported as notices.
#[utoipa::path(
    get,
    path = "/api/cars/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Car id")),
    responses(
        (status = 200, description = "Car with details and finance", body = CarView),
        (status = 404, description = "No such car", body = ApiError)
    ),
    tag = "cars"
)]
pub async fn get_car(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<CarView>, ApiError> {
    Ok(Json(CarController::new(&session, &state.config).get(id).await?))
}

/// Add a car (admin)
#[utoipa::path(
    post,
    path = "/api/cars",
    security(("bearer_auth" = [])),
    request_body = CarDraft,
    responses(
        (status = 201, description = "Car created; side-effect failures listed as notices", body = Saved<CarCard>),
        (status = 400, description = "Invalid draft", body = ApiError),
        (status = 403, description = "Caller is not an admin", body = ApiError)
    ),
    tag = "cars"
)]
pub async fn create_car(
    State(state): State<AppState>,
    session: Session,
    payload: Result<Json<CarDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<Saved<CarCard>>), ApiError> {
    let Json(draft) = payload?;
    let saved = CarController::new(&session, &state.config)
        .save(None, draft)
        .await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

/// Edit a car (admin)
#[utoipa::path(
    put,
    path = "/api/cars/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Car id")),
    request_body = CarDraft,
    responses(
        (status = 200, description = "Car updated", body = Saved<CarCard>),
        (status = 400, description = "Invalid draft", body = ApiError),
        (status = 403, description = "Caller is not an admin", body = ApiError),
        (status = 404, description = "No such car", body = ApiError)
    ),
    tag = "cars"
)]
pub async fn update_car(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    payload: Result<Json<CarDraft>, JsonRejection>,
) -> Result<Json<Saved<CarCard>>, ApiError> {
    let Json(draft) = payload?;
    let saved = CarController::new(&session, &state.config)
        .save(Some(id), draft)
        .await?;
    Ok(Json(saved))
}

/// Delete a car (admin)
#[utoipa::path(
    delete,
    path = "/api/cars/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Car id")),
    responses(
        (status = 204, description = "Car deleted"),
        (status = 403, description = "Caller is not an admin", body = ApiError)
    ),
    tag = "cars"
)]
pub async fn delete_car(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    CarController::new(&session, &state.config)
        .delete(id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
