mod common;

use common::*;
use dispatch_core::{config::Config, infra::mock_gateway::MockGateway, transport::http, AppState};
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

fn dev_config() -> Config {
    Config {
        database_url: String::new(),
        app_env: "development".to_string(),
        stripe_secret_key: None,
        stripe_webhook_secret: None,
        sweep_interval_secs: 300,
    }
}

fn app(pool: sqlx::PgPool) -> axum::Router {
    let state = AppState {
        pool,
        gateway: Arc::new(MockGateway::new()),
        config: dev_config(),
    };
    http::router().with_state(state)
}

fn dev_bypass(uid: Uuid, role: &str) -> String {
    format!("{uid}:{role}")
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn create_booking_redacts_otp_from_provider_but_not_customer() {
    let pool = setup_pool("dispatch_test_http").await;
    let service_id = make_service(&pool, "Standard Callout", 10_000).await;
    let provider_uid = make_online_provider(&pool, service_id).await;
    let customer_id = Uuid::now_v7();
    let app = app(pool);

    let req = Request::builder()
        .method("POST")
        .uri("/v1/bookings")
        .header("content-type", "application/json")
        .header("x-dev-bypass", dev_bypass(customer_id, "user"))
        .body(Body::from(
            json!({
                "service_id": service_id,
                "slot_id": Uuid::now_v7(),
                "user_id": customer_id,
            })
            .to_string(),
        ))
        .unwrap();

    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["status"], "pending_payment");
    assert!(body["otp"].is_number(), "owning customer should see the otp");
    let booking_id = body["id"].as_str().unwrap().to_string();

    let req = Request::builder()
        .method("GET")
        .uri(format!("/v1/bookings/{booking_id}"))
        .header("x-dev-bypass", dev_bypass(provider_uid, "provider"))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["otp"].is_null(), "candidate provider must not see the otp");
}

#[tokio::test]
async fn missing_principal_is_rejected() {
    let pool = setup_pool("dispatch_test_http").await;
    let app = app(pool);

    let req = Request::builder()
        .method("GET")
        .uri("/v1/bookings/claimed")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn create_rejects_mismatched_user_id() {
    let pool = setup_pool("dispatch_test_http").await;
    let service_id = make_service(&pool, "Standard Callout", 10_000).await;
    let caller_id = Uuid::now_v7();
    let impersonated_id = Uuid::now_v7();
    let app = app(pool);

    let req = Request::builder()
        .method("POST")
        .uri("/v1/bookings")
        .header("content-type", "application/json")
        .header("x-dev-bypass", dev_bypass(caller_id, "user"))
        .body(Body::from(
            json!({
                "service_id": service_id,
                "slot_id": Uuid::now_v7(),
                "user_id": impersonated_id,
            })
            .to_string(),
        ))
        .unwrap();

    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_webhook_provider_is_rejected_before_signature_check() {
    let pool = setup_pool("dispatch_test_http").await;
    let app = app(pool);

    let req = Request::builder()
        .method("POST")
        .uri("/v1/webhooks/paypal")
        .body(Body::from("{}"))
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn stripe_webhook_without_signature_header_is_rejected() {
    let pool = setup_pool("dispatch_test_http").await;
    let app = app(pool);

    let req = Request::builder()
        .method("POST")
        .uri("/v1/webhooks/stripe")
        .body(Body::from("{}"))
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn services_listing_is_public() {
    let pool = setup_pool("dispatch_test_http").await;
    make_service(&pool, "Priority Callout", 18_000).await;
    let app = app(pool);

    let req = Request::builder()
        .method("GET")
        .uri("/v1/services")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body.as_array().unwrap().iter().any(|s| s["name"] == "Priority Callout"));
}
