//! Integration tests for the refresh HTTP endpoints.
//!
//! Requests go through the full router (trace and timeout layers included)
//! via `tower::ServiceExt::oneshot`.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use catalog_refresh::adapters::http::{app_router, RefreshAppState};
use catalog_refresh::adapters::memory::{InMemoryProductStore, InMemoryRefreshJobStore};
use catalog_refresh::adapters::paapi::MockProductApi;
use catalog_refresh::adapters::resilience::InMemoryCircuitBreaker;
use catalog_refresh::application::{RefreshProductsHandler, RefreshSettings};
use catalog_refresh::domain::catalog::{ItemId, Product};
use catalog_refresh::domain::foundation::CorrelationId;
use catalog_refresh::ports::CircuitBreaker;

// =============================================================================
// Test Infrastructure
// =============================================================================

struct App {
    router: Router,
    handler: Arc<RefreshProductsHandler>,
    products: InMemoryProductStore,
    breaker: Arc<InMemoryCircuitBreaker>,
}

fn app_with(products: Vec<Product>, api_delay: Duration) -> App {
    app_with_timeout(products, api_delay, Duration::from_secs(30))
}

fn app_with_timeout(products: Vec<Product>, api_delay: Duration, request_timeout: Duration) -> App {
    let breaker = Arc::new(InMemoryCircuitBreaker::with_defaults("paapi"));
    let store = InMemoryProductStore::with_products(products);
    let api = MockProductApi::new(breaker.clone()).with_delay(api_delay);
    let handler = Arc::new(RefreshProductsHandler::new(
        Arc::new(store.clone()),
        Arc::new(InMemoryRefreshJobStore::new()),
        Arc::new(api),
        breaker.clone(),
        RefreshSettings::default(),
    ));
    let state = RefreshAppState::new(handler.clone(), breaker.clone());
    App {
        router: app_router(state, request_timeout),
        handler,
        products: store,
        breaker,
    }
}

fn app(products: Vec<Product>) -> App {
    app_with(products, Duration::ZERO)
}

fn products(count: u32) -> Vec<Product> {
    (1..=count)
        .map(|n| Product::new(ItemId::new(format!("B{:09}", n)).unwrap()))
        .collect()
}

fn request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn send(router: &Router, req: Request<Body>) -> (StatusCode, Option<String>, Value) {
    let response = router.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let header = response
        .headers()
        .get("x-correlation-id")
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, header, body)
}

// =============================================================================
// Trigger
// =============================================================================

#[tokio::test]
async fn post_runs_refresh_and_returns_summary() {
    let app = app(products(3));

    let (status, header, body) = send(&app.router, request(Method::POST, "/api/refresh")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Processed 3 products");
    assert_eq!(body["metrics"]["processed"], 3);
    assert_eq!(body["metrics"]["success"], 3);
    assert_eq!(body["metrics"]["failure"], 0);
    assert_eq!(body["metrics"]["skipped"], 0);
    assert!(body["metrics"]["duration_ms"].is_u64());
    assert_eq!(header.as_deref(), body["correlation_id"].as_str());
    for p in app.products.all().await {
        assert!(p.last_refresh_at.is_some());
    }
}

#[tokio::test]
async fn correlation_id_header_is_echoed() {
    let app = app(products(1));
    let id = CorrelationId::new();
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/refresh")
        .header("x-correlation-id", id.to_string())
        .body(Body::empty())
        .unwrap();

    let (status, header, body) = send(&app.router, req).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(header, Some(id.to_string()));
    assert_eq!(body["correlation_id"], id.to_string());
}

#[tokio::test]
async fn malformed_correlation_id_is_replaced() {
    let app = app(vec![]);
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/refresh")
        .header("x-correlation-id", "not-a-uuid")
        .body(Body::empty())
        .unwrap();

    let (status, header, body) = send(&app.router, req).await;

    assert_eq!(status, StatusCode::OK);
    let header = header.unwrap();
    assert_ne!(header, "not-a-uuid");
    assert!(header.parse::<CorrelationId>().is_ok());
    assert_eq!(body["metrics"]["processed"], 0);
}

#[tokio::test]
async fn other_methods_get_405_envelope() {
    let app = app(products(1));

    for method in [Method::GET, Method::PUT, Method::DELETE] {
        let (status, header, body) = send(&app.router, request(method, "/api/refresh")).await;

        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "METHOD_NOT_ALLOWED");
        assert!(body["error"]["message"].is_string());
        assert_eq!(header.as_deref(), body["correlation_id"].as_str());
    }
    assert!(app.products.all().await[0].last_refresh_at.is_none());
}

#[tokio::test]
async fn store_failure_returns_500_database_error() {
    let app = app(products(1));
    app.products.fail_selection(true).await;

    let (status, _, body) = send(&app.router, request(Method::POST, "/api/refresh")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "DATABASE_ERROR");
}

#[tokio::test]
async fn unconfigured_worker_returns_configuration_error() {
    let breaker: Arc<dyn CircuitBreaker> = Arc::new(InMemoryCircuitBreaker::with_defaults("paapi"));
    let state = RefreshAppState::unconfigured("Database connection is not configured", breaker);
    let router = app_router(state, Duration::from_secs(30));

    let (status, _, body) = send(&router, request(Method::POST, "/api/refresh")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "CONFIGURATION_ERROR");
    assert_eq!(body["error"]["message"], "Database connection is not configured");
}

#[tokio::test]
async fn overlapping_trigger_gets_409() {
    let app = app_with(products(1), Duration::from_millis(300));

    let router = app.router.clone();
    let first = tokio::spawn(async move {
        router
            .oneshot(request(Method::POST, "/api/refresh"))
            .await
            .unwrap()
            .status()
    });
    while !app.handler.is_running() {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let (status, _, body) = send(&app.router, request(Method::POST, "/api/refresh")).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "REFRESH_IN_PROGRESS");
    assert_eq!(first.await.unwrap(), StatusCode::OK);
}

#[tokio::test]
async fn timed_out_request_gets_error_envelope_and_run_finishes() {
    let app = app_with_timeout(products(1), Duration::from_millis(300), Duration::from_millis(50));
    let id = CorrelationId::new();
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/refresh")
        .header("x-correlation-id", id.to_string())
        .body(Body::empty())
        .unwrap();

    let (status, header, body) = send(&app.router, req).await;

    assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "REQUEST_TIMEOUT");
    assert_eq!(body["correlation_id"], id.to_string());
    assert_eq!(header, Some(id.to_string()));

    let mut waited = Duration::ZERO;
    while app.handler.is_running() && waited < Duration::from_secs(5) {
        tokio::time::sleep(Duration::from_millis(20)).await;
        waited += Duration::from_millis(20);
    }
    assert!(!app.handler.is_running());
    for p in app.products.all().await {
        assert!(p.last_refresh_at.is_some());
    }
}

#[tokio::test]
async fn timed_out_request_without_header_still_carries_an_id() {
    let app = app_with_timeout(products(1), Duration::from_millis(300), Duration::from_millis(50));

    let (status, header, body) = send(&app.router, request(Method::POST, "/api/refresh")).await;

    assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
    let id = body["correlation_id"].as_str().unwrap();
    assert!(id.parse::<CorrelationId>().is_ok());
    assert_eq!(header.as_deref(), Some(id));
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn health_reports_breaker_snapshot() {
    let app = app(vec![]);
    app.breaker.force_open();

    let (status, _, body) = send(&app.router, request(Method::GET, "/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["refresh_configured"], true);
    assert_eq!(body["refresh_running"], false);
    assert_eq!(body["circuit_breaker"]["state"], "open");
    assert_eq!(body["circuit_breaker"]["times_opened"], 1);
    assert!(body["circuit_breaker"]["time_until_half_open_ms"].as_u64().unwrap() > 0);
}
