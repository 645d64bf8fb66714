//! # Error Handling
//!
//! Unified error handling for the showroom API: every failure is answered
//! with an `application/problem+json` body carrying a stable code, a
//! human-readable message, optional technical details and the request's
//! trace id.

use std::any::Any;

use axum::{
    extract::rejection::JsonRejection,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use utoipa::ToSchema;

use crate::backend::BackendError;
use crate::models::ValidationError;
use crate::telemetry;

/// Where the UI sends users whose profile has no role.
pub const NOT_ALLOWED_PATH: &str = "/not-allowed";

/// Unified API error response structure
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ApiError {
    /// HTTP status code for the response
    #[serde(skip_serializing, skip_deserializing)]
    pub status: StatusCode,
    /// Error code for programmatic handling
    pub code: Box<str>,
    /// Human-readable error message
    pub message: Box<str>,
    /// Technical details (backend code, hint, offending fields)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Box<serde_json::Value>>,
    /// Correlation trace ID for debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<Box<str>>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into().into_boxed_str(),
            message: message.into().into_boxed_str(),
            details: None,
            trace_id: Self::current_trace_id(),
        }
    }

    pub fn with_details<V: Into<serde_json::Value>>(mut self, details: V) -> Self {
        self.details = Some(Box::new(details.into()));
        self
    }

    /// Trace id of the running request, or a generated correlation id outside one.
    fn current_trace_id() -> Option<Box<str>> {
        telemetry::current_trace_id()
            .map(|trace_id| trace_id.into_boxed_str())
            .or_else(|| {
                Some(format!("corr-{}", &uuid::Uuid::new_v4().simple().to_string()[..8]).into_boxed_str())
            })
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut headers = HeaderMap::new();
        headers.insert(
            "content-type",
            HeaderValue::from_static("application/problem+json"),
        );
        (self.status, headers, axum::Json(self)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let message = match rejection {
            JsonRejection::JsonDataError(err) => format!("Invalid JSON: {}", err.body_text()),
            JsonRejection::JsonSyntaxError(err) => format!("JSON syntax error: {}", err.body_text()),
            JsonRejection::MissingJsonContentType(_) => {
                "Missing 'Content-Type: application/json' header".to_string()
            }
            _ => "Invalid request body".to_string(),
        };

        Self::new(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", message)
    }
}

impl From<ValidationError> for ApiError {
    fn from(error: ValidationError) -> Self {
        validation_error(&error.message, json!({ "fields": error.fields }))
    }
}

impl From<BackendError> for ApiError {
    fn from(error: BackendError) -> Self {
        if error.is_missing_relation() {
            tracing::error!(error = %error, "Backend schema is missing a relation");
            return database_not_ready(&error);
        }

        match error {
            BackendError::Api {
                operation,
                status,
                fault,
            } => {
                let (api_status, code) = match status {
                    401 => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
                    403 => (StatusCode::FORBIDDEN, "FORBIDDEN"),
                    404 => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                    409 => (StatusCode::CONFLICT, "CONFLICT"),
                    _ => (StatusCode::BAD_GATEWAY, "BACKEND_ERROR"),
                };
                let message = if fault.message.is_empty() {
                    format!("Backend returned status {status}")
                } else {
                    fault.message.clone()
                };
                ApiError::new(api_status, code, message).with_details(json!({
                    "operation": operation,
                    "status": status,
                    "code": fault.code,
                    "details": fault.details,
                    "hint": fault.hint,
                    "body_snippet": fault.body_snippet,
                }))
            }
            BackendError::Transport { operation, source } => {
                tracing::error!(operation = %operation, error = %source, "Backend unreachable");
                ApiError::new(
                    StatusCode::BAD_GATEWAY,
                    "BACKEND_UNREACHABLE",
                    "The data backend could not be reached",
                )
                .with_details(json!({
                    "operation": operation,
                    "timeout": source.is_timeout(),
                }))
            }
            BackendError::Schema {
                resource,
                row,
                message,
                fields,
            } => {
                tracing::error!(resource = %resource, ?row, message = %message, "Backend returned malformed data");
                ApiError::new(
                    StatusCode::BAD_GATEWAY,
                    "BACKEND_SCHEMA",
                    format!("Unexpected {resource} data from the backend"),
                )
                .with_details(json!({
                    "resource": resource,
                    "row": row,
                    "message": message,
                    "fields": fields,
                }))
            }
        }
    }
}

fn database_not_ready(error: &BackendError) -> ApiError {
    let mut details = json!({ "code": error.code() });
    if let BackendError::Api { fault, .. } = error {
        details["message"] = json!(fault.message);
    }
    ApiError::new(
        StatusCode::SERVICE_UNAVAILABLE,
        "DATABASE_NOT_READY",
        "Database not ready: a required table is missing. Apply the project SQL to the backend.",
    )
    .with_details(details)
}

/// Create an unauthorized error (401)
pub fn unauthorized(message: Option<&str>) -> ApiError {
    let msg = message.unwrap_or("Authentication required");
    ApiError::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg)
}

/// Create a forbidden error (403)
pub fn forbidden(message: Option<&str>) -> ApiError {
    let msg = message.unwrap_or("Insufficient permissions");
    ApiError::new(StatusCode::FORBIDDEN, "FORBIDDEN", msg)
}

/// The signed-in user has no usable role.
pub fn role_not_assigned() -> ApiError {
    ApiError::new(
        StatusCode::FORBIDDEN,
        "ROLE_NOT_ASSIGNED",
        "No role is assigned to this account",
    )
    .with_details(json!({ "redirect": NOT_ALLOWED_PATH }))
}

pub fn not_found(resource: &str) -> ApiError {
    ApiError::new(
        StatusCode::NOT_FOUND,
        "NOT_FOUND",
        format!("{resource} not found"),
    )
}

/// Backend URL or key is not configured.
pub fn config_missing() -> ApiError {
    ApiError::new(
        StatusCode::SERVICE_UNAVAILABLE,
        "CONFIG_MISSING",
        "Backend configuration is missing; set SHOWROOM_BACKEND_URL and SHOWROOM_BACKEND_ANON_KEY",
    )
}

/// Create a validation error with field details
pub fn validation_error(message: &str, field_errors: serde_json::Value) -> ApiError {
    ApiError::new(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", message).with_details(field_errors)
}

/// Response for a handler that panicked.
pub fn handler_panicked(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = detail, "Request handler panicked");
    ApiError::new(
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_SERVER_ERROR",
        "Something went wrong. Reload the page and try again.",
    )
    .into_response()
}
