//! Routing, authentication and role checks through the full router.

mod test_utils;

use std::fs;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use serde_json::json;
use showroom::server::{AppState, create_app};
use tempfile::TempDir;
use test_utils::{
    app_for, config_for, get, mount_session, request, send, send_raw, unconfigured_state,
};
use uuid::Uuid;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

fn without_token(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn ui_paths_fall_back_to_index_html() {
    let server = MockServer::start().await;
    let dist = TempDir::new().unwrap();
    fs::write(
        dist.path().join("index.html"),
        "<!doctype html><div id=\"root\"></div>",
    )
    .unwrap();
    fs::create_dir(dist.path().join("assets")).unwrap();
    fs::write(dist.path().join("assets/app.js"), "console.log('ui');").unwrap();

    let mut config = config_for(&server);
    config.dist_dir = dist.path().to_path_buf();
    let app = create_app(AppState::from_config(config).unwrap());

    let (status, body) = send_raw(app.clone(), without_token("/cars/abc")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("id=\"root\""));

    let (status, body) = send_raw(app.clone(), without_token("/assets/app.js")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "console.log('ui');");

    let (status, body) = send_raw(app, without_token("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("id=\"root\""));
}

#[tokio::test]
async fn missing_backend_config_serves_the_notice_page() {
    let app = create_app(unconfigured_state());

    let (status, body) = send_raw(app.clone(), without_token("/dashboard")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body.contains("SHOWROOM_BACKEND_URL"));
    assert!(body.contains("SHOWROOM_BACKEND_ANON_KEY"));

    let (status, body) = send(app.clone(), get("/api/cars")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "CONFIG_MISSING");

    let (status, body) = send(app.clone(), without_token("/api/config")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["configured"], false);

    let (status, body) = send(app, without_token("/healthz")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["backend_configured"], false);
}

#[tokio::test]
async fn api_requires_a_bearer_token() {
    let server = MockServer::start().await;

    let (status, body) = send(app_for(&server), without_token("/api/dashboard")).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn rejected_token_is_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "code": 401,
            "msg": "invalid JWT",
        })))
        .mount(&server)
        .await;

    let (status, body) = send(app_for(&server), get("/api/session")).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid or expired access token");
}

#[tokio::test]
async fn profile_without_role_is_sent_to_not_allowed() {
    let server = MockServer::start().await;
    mount_session(&server, None).await;

    let (status, body) = send(app_for(&server), get("/api/session")).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "ROLE_NOT_ASSIGNED");
    assert_eq!(body["details"]["redirect"], "/not-allowed");
}

#[tokio::test]
async fn session_reports_role_and_permissions() {
    let server = MockServer::start().await;
    mount_session(&server, Some("sales")).await;

    let (status, body) = send(app_for(&server), get("/api/session")).await;

    assert_eq!(status, StatusCode::OK, "body: {body}");
    assert_eq!(body["role"], "sales");
    assert_eq!(body["role_label"], "مبيعات");
    assert_eq!(body["email"], "staff@showroom.test");
    assert_eq!(body["permissions"]["record_sales"], true);
    assert_eq!(body["permissions"]["manage_cars"], false);
}

#[tokio::test]
async fn sales_role_cannot_change_cars_or_suppliers() {
    let server = MockServer::start().await;
    mount_session(&server, Some("sales")).await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/cars"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let app = app_for(&server);
    let draft = json!({ "make": "Kia", "model": "Rio", "asking_price": "45000" });

    let (status, body) = send(app.clone(), request(Method::POST, "/api/cars", Some(draft))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let car = format!("/api/cars/{}", Uuid::new_v4());
    let (status, _) = send(app.clone(), request(Method::DELETE, &car, None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(app.clone(), get("/api/suppliers")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(app.clone(), get("/api/cars/suppliers")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let sale = format!("/api/sales/{}", Uuid::new_v4());
    let (status, _) = send(app, request(Method::DELETE, &sale, None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn invalid_car_id_is_a_bad_request() {
    let server = MockServer::start().await;
    mount_session(&server, Some("admin")).await;

    let (status, _) = send_raw(app_for(&server), get("/api/cars/not-a-uuid")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_api_route_is_a_json_404() {
    let server = MockServer::start().await;

    let (status, body) = send(app_for(&server), without_token("/api/nope/deeper")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
    assert_eq!(body["message"], "Route not found");
}

#[tokio::test]
async fn openapi_document_is_served() {
    let (status, body) = send(create_app(unconfigured_state()), without_token("/openapi.json")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["info"]["title"], "Showroom Back Office API");
    assert!(body["paths"]["/api/cars"].is_object());
    assert!(body["components"]["securitySchemes"]["bearer_auth"].is_object());
}

#[tokio::test]
async fn service_info_is_public() {
    let (status, body) = send(create_app(unconfigured_state()), without_token("/api")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"], "showroom");
}
