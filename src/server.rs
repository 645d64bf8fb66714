//! # Server Configuration
//!
//! Router, middleware stack and startup for the showroom back office.

use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router, middleware,
    routing::{any, get},
};
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::backend::BackendClient;
use crate::config::AppConfig;
use crate::error::handler_panicked;
use crate::handlers::{self, spa};
use crate::telemetry::trace_context_middleware;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    /// `None` while the backend URL or key is missing.
    pub backend: Option<BackendClient>,
}

impl AppState {
    /// Builds the state, constructing the backend client when it is configured.
    pub fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let backend = config
            .backend_config()?
            .map(BackendClient::new)
            .transpose()
            .context("failed to build backend client")?;
        Ok(Self {
            config: Arc::new(config),
            backend,
        })
    }
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    let api = Router::new()
        .route("/api", get(handlers::root))
        .route("/api/config", get(handlers::config::get_config_status))
        .route("/api/session", get(handlers::session::get_session))
        .route("/api/dashboard", get(handlers::dashboard::get_dashboard))
        .route(
            "/api/cars",
            get(handlers::cars::list_cars).post(handlers::cars::create_car),
        )
        .route(
            "/api/cars/price-ceiling",
            get(handlers::cars::get_price_ceiling),
        )
        .route("/api/cars/catalog", get(handlers::cars::get_catalog))
        .route(
            "/api/cars/suppliers",
            get(handlers::cars::list_supplier_options),
        )
        .route(
            "/api/cars/{id}",
            get(handlers::cars::get_car)
                .put(handlers::cars::update_car)
                .delete(handlers::cars::delete_car),
        )
        .route(
            "/api/customers",
            get(handlers::customers::list_customers).post(handlers::customers::create_customer),
        )
        .route(
            "/api/customers/{id}",
            axum::routing::put(handlers::customers::update_customer)
                .delete(handlers::customers::delete_customer),
        )
        .route(
            "/api/suppliers",
            get(handlers::suppliers::list_suppliers).post(handlers::suppliers::create_supplier),
        )
        .route(
            "/api/suppliers/{id}",
            axum::routing::put(handlers::suppliers::update_supplier)
                .delete(handlers::suppliers::delete_supplier),
        )
        .route(
            "/api/sales",
            get(handlers::sales::list_sales).post(handlers::sales::record_sale),
        )
        .route("/api/sales/options", get(handlers::sales::get_sale_options))
        .route(
            "/api/sales/{id}",
            axum::routing::delete(handlers::sales::delete_sale),
        )
        .route("/api/{*rest}", any(handlers::api_not_found))
        .route("/healthz", get(handlers::healthz));

    let app = if state.backend.is_some() {
        api.fallback_service(spa::ui_service(&state.config.dist_dir))
    } else {
        api.fallback(spa::config_missing_page)
    };

    app.with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(CatchPanicLayer::custom(handler_panicked))
        .layer(middleware::from_fn(trace_context_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Starts the server with the given configuration
pub async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    let addr = config.bind_addr().context("invalid server address")?;
    let profile = config.profile.clone();
    let state = AppState::from_config(config)?;
    if state.backend.is_none() {
        tracing::warn!("Backend is not configured; serving the configuration-missing page");
    }
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, %profile, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::healthz,
        crate::handlers::config::get_config_status,
        crate::handlers::session::get_session,
        crate::handlers::dashboard::get_dashboard,
        crate::handlers::cars::list_cars,
        crate::handlers::cars::get_price_ceiling,
        crate::handlers::cars::get_catalog,
        crate::handlers::cars::list_supplier_options,
        crate::handlers::cars::get_car,
        crate::handlers::cars::create_car,
        crate::handlers::cars::update_car,
        crate::handlers::cars::delete_car,
        crate::handlers::customers::list_customers,
        crate::handlers::customers::create_customer,
        crate::handlers::customers::update_customer,
        crate::handlers::customers::delete_customer,
        crate::handlers::suppliers::list_suppliers,
        crate::handlers::suppliers::create_supplier,
        crate::handlers::suppliers::update_supplier,
        crate::handlers::suppliers::delete_supplier,
        crate::handlers::sales::list_sales,
        crate::handlers::sales::get_sale_options,
        crate::handlers::sales::record_sale,
        crate::handlers::sales::delete_sale,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::error::ApiError,
            crate::handlers::HealthStatus,
            crate::handlers::config::ConfigStatus,
            crate::handlers::session::SessionInfo,
            crate::auth::Permissions,
            crate::models::Role,
            crate::models::CarStatus,
            crate::models::PaymentMethod,
            crate::format::Variant,
            crate::controllers::Notice,
            crate::controllers::EmptyState,
            crate::controllers::KpiCard,
            crate::controllers::Icon,
        )
    ),
    modifiers(&BearerAuth),
    info(
        title = "Showroom Back Office API",
        description = "Inventory, customers, suppliers and sales for a used-car showroom",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
