//! Test utilities for exercising the API against a mocked backend.
//!
//! A [`MockServer`] stands in for the hosted backend: the auth service,
//! PostgREST tables and storage all live under its base URI. Requests go
//! through the real router with `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use showroom::{config::AppConfig, server::AppState};
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

pub const TOKEN: &str = "test-access-token";

/// Fixed id for the signed-in test user.
pub fn user_id() -> Uuid {
    Uuid::parse_str("6f1c2d3e-4b5a-4c6d-8e7f-9a0b1c2d3e4f").unwrap()
}

/// Configuration pointing at the mock backend.
pub fn config_for(server: &MockServer) -> AppConfig {
    AppConfig {
        backend_url: Some(server.uri()),
        backend_anon_key: Some("anon-test-key".to_string()),
        ..AppConfig::default()
    }
}

pub fn state_for(server: &MockServer) -> AppState {
    AppState::from_config(config_for(server)).expect("state builds")
}

/// State with no backend settings at all.
pub fn unconfigured_state() -> AppState {
    AppState {
        config: Arc::new(AppConfig::default()),
        backend: None,
    }
}

pub fn app_for(server: &MockServer) -> Router {
    showroom::server::create_app(state_for(server))
}

/// Mounts the auth user lookup and a profile row with `role`.
/// `None` leaves the profile without a role.
pub async fn mount_session(server: &MockServer, role: Option<&str>) {
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": user_id(),
            "email": "staff@showroom.test",
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .and(query_param("id", format!("eq.{}", user_id())))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": user_id(),
            "full_name": "سامي",
            "role": role,
        }])))
        .mount(server)
        .await;
}

/// Mounts the price ceiling lookup returning `max` as the highest asking price.
pub async fn mount_price_ceiling(server: &MockServer, max: Option<f64>) {
    let body = match max {
        Some(price) => json!([{ "asking_price": price }]),
        None => json!([]),
    };
    Mock::given(method("GET"))
        .and(path("/rest/v1/cars"))
        .and(query_param("select", "asking_price"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// A `cars` row as PostgREST returns it.
pub fn car_row(id: Uuid, make: &str, model: &str, status: &str, price: f64) -> Value {
    json!({
        "id": id,
        "plate_number": "12-345-67",
        "vin": null,
        "color": "أبيض",
        "make": make,
        "model": model,
        "year": 2019,
        "type": "سيدان",
        "status": status,
        "asking_price": price,
        "mileage": 84000,
        "main_image_url": null,
        "created_at": "2025-01-10T09:30:00Z",
    })
}

pub fn request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"));
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    builder.body(body).unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    request(Method::GET, uri, None)
}

/// Sends a request through the router and returns status plus raw body.
pub async fn send_raw(app: Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8_lossy(&bytes).into_owned())
}

/// Sends a request and parses the body as JSON (`Null` when empty).
pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, body) = send_raw(app, request).await;
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&body).unwrap_or_else(|err| panic!("body is not JSON ({err}): {body}"))
    };
    (status, value)
}
