//! Telemetry utilities for request-scoped tracing metadata and global subscriber management.

use std::any::type_name_of_val;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use log::LevelFilter;
use thiserror::Error;
use tokio::task_local;
use tracing_log::LogTracer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::Layer,
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
};

use crate::config::AppConfig;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Longest caller-supplied request id that is echoed back as-is.
const MAX_REQUEST_ID_LEN: usize = 128;

/// Trace context containing request correlation ID.
#[derive(Debug, Clone)]
pub struct TraceContext {
    pub trace_id: String,
}

task_local! {
    static ACTIVE_TRACE_CONTEXT: TraceContext;
}

/// Errors that can occur while initializing global telemetry.
#[derive(Debug, Error)]
pub enum TelemetryInitError {
    #[error("failed to install log tracer bridge: {0}")]
    LogTracer(#[from] log::SetLoggerError),
    #[error("failed to install tracing subscriber: {0}")]
    Subscriber(#[from] TryInitError),
}

static TELEMETRY_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initialize global tracing/logging exactly once, wiring `log::` macros into the tracing pipeline.
pub fn init_tracing(config: &AppConfig) -> Result<(), TelemetryInitError> {
    if TELEMETRY_INITIALIZED
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        return Ok(());
    }

    if let Err(err) = LogTracer::builder()
        .with_max_level(LevelFilter::Trace)
        .init()
    {
        // Another LogTracer (tests, embedding binary) is fine.
        let logger_type = type_name_of_val(log::logger());
        if !logger_type.contains("LogTracer") {
            eprintln!(
                "Warning: Failed to install log tracer bridge: {}. `log::` macros will not emit tracing events.",
                err
            );
        }
    }

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let fmt_layer = match config.log_format.as_str() {
        "pretty" => fmt::layer().pretty().boxed(),
        _ => fmt::layer().json().boxed(),
    };

    if let Err(err) = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
    {
        TELEMETRY_INITIALIZED.store(false, Ordering::SeqCst);
        eprintln!(
            "Warning: Failed to set global tracing subscriber: {}. Default subscriber remains in effect.",
            err
        );
    }

    Ok(())
}

/// Execute `future` within the provided trace context, making it available through task-local
/// storage for the duration of the request.
pub async fn with_trace_context<Fut, R>(context: TraceContext, future: Fut) -> R
where
    Fut: std::future::Future<Output = R>,
{
    ACTIVE_TRACE_CONTEXT.scope(context, future).await
}

/// Get the currently active trace ID, if one has been set for the running task.
pub fn current_trace_id() -> Option<String> {
    ACTIVE_TRACE_CONTEXT
        .try_with(|ctx| ctx.trace_id.clone())
        .ok()
}

fn usable_request_id(value: &HeaderValue) -> Option<String> {
    let id = value.to_str().ok()?.trim();
    let ok = !id.is_empty()
        && id.len() <= MAX_REQUEST_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'));
    ok.then(|| id.to_string())
}

/// Scopes every request in a [`TraceContext`] taken from `x-request-id`
/// (or freshly generated) and echoes the id on the response.
pub async fn trace_context_middleware(mut request: Request, next: Next) -> Response {
    let trace_id = request
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(usable_request_id)
        .unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string());

    let context = TraceContext {
        trace_id: trace_id.clone(),
    };
    request.extensions_mut().insert(context.clone());

    let mut response = with_trace_context(context, next.run(request)).await;
    if let Ok(value) = HeaderValue::from_str(&trace_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn trace_id_is_visible_inside_scope_only() {
        assert_eq!(current_trace_id(), None);
        let seen = with_trace_context(
            TraceContext {
                trace_id: "abc-123".to_string(),
            },
            async { current_trace_id() },
        )
        .await;
        assert_eq!(seen.as_deref(), Some("abc-123"));
    }

    #[test]
    fn request_ids_are_sanitized() {
        assert_eq!(
            usable_request_id(&HeaderValue::from_static("req-42")).as_deref(),
            Some("req-42")
        );
        assert_eq!(usable_request_id(&HeaderValue::from_static("   ")), None);
        assert_eq!(usable_request_id(&HeaderValue::from_static("a b")), None);
        let long = "x".repeat(MAX_REQUEST_ID_LEN + 1);
        assert_eq!(
            usable_request_id(&HeaderValue::from_str(&long).unwrap()),
            None
        );
    }
}
