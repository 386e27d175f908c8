mod common;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::extract::connect_info::MockConnectInfo;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;

use assumption_gate_lib::engine::RowStore;
use assumption_gate_lib::http::{router, MAX_BODY_BYTES};
use assumption_gate_lib::interceptor::AuditRecorder;

use common::{app_state, seeded_store, KEY};

async fn app_from(peer: SocketAddr) -> Router {
    let store = seeded_store().await;
    let state = Arc::new(app_state(store, Arc::new(AuditRecorder::in_memory()), true));
    router(state).layer(MockConnectInfo(peer))
}

async fn app() -> Router {
    app_from(SocketAddr::from(([10, 0, 0, 5], 40000))).await
}

fn assumption_request() -> axum::http::request::Builder {
    Request::builder()
        .method("POST")
        .uri("/assumption")
        .header("content-type", "application/json")
}

async fn read_json(response: axum::response::Response) -> JsonValue {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn committed() -> JsonValue {
    json!({"assumption": {
        "osc_payment_contract.OXSTATE": "committed",
        "where": {"OXID": "c-1"}
    }})
}

#[tokio::test]
async fn test_healthz() {
    let response = app()
        .await
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_healthz_reports_unavailable_store() {
    let store = seeded_store().await;
    let state = Arc::new(app_state(store.clone(), Arc::new(AuditRecorder::in_memory()), true));
    store.close().await;

    let response = router(state)
        .layer(MockConnectInfo(SocketAddr::from(([10, 0, 0, 5], 40000))))
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(read_json(response).await, json!({"status": "unavailable"}));
}

#[tokio::test]
async fn test_assumption_with_api_key_header() {
    let payload = committed();
    let request = assumption_request()
        .header("x-api-key", KEY)
        .body(Body::from(payload.to_string()))
        .unwrap();

    let response = app().await.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["assumption"], json!(true));
    assert_eq!(body["actual_value"], json!("committed"));
}

#[tokio::test]
async fn test_assumption_with_bearer_token() {
    let payload = committed();
    let request = assumption_request()
        .header("authorization", format!("Bearer {KEY}"))
        .body(Body::from(payload.to_string()))
        .unwrap();

    let response = app().await.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_ipv4_mapped_peer_is_normalized() {
    let peer: SocketAddr = "[::ffff:10.0.0.5]:40000".parse().unwrap();
    let payload = committed();
    let request = assumption_request()
        .header("x-api-key", KEY)
        .body(Body::from(payload.to_string()))
        .unwrap();

    let response = app_from(peer).await.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_peer_is_unauthorized() {
    let payload = committed();
    let request = assumption_request()
        .header("x-api-key", KEY)
        .body(Body::from(payload.to_string()))
        .unwrap();

    let response = app_from(SocketAddr::from(([172, 16, 0, 1], 40000)))
        .await
        .oneshot(request)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(read_json(response).await, json!({"error": "Unauthorized"}));
}

#[tokio::test]
async fn test_validation_error_status() {
    let payload = json!({"assumption": {"osc_payment_contract.OXSTATE": 1, "operator": "LIKE"}});
    let request = assumption_request()
        .header("x-api-key", KEY)
        .body(Body::from(payload.to_string()))
        .unwrap();

    let response = app().await.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("allowed operators"));
}

#[tokio::test]
async fn test_oversized_body_rejected() {
    let filler = "x".repeat(MAX_BODY_BYTES + 1);
    let request = Request::builder()
        .method("POST")
        .uri("/assumption")
        .header("x-api-key", KEY)
        .body(Body::from(filler))
        .unwrap();

    let response = app().await.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_metrics_reflect_requests() {
    let store = seeded_store().await;
    let state = Arc::new(app_state(store, Arc::new(AuditRecorder::in_memory()), true));
    let app = router(Arc::clone(&state)).layer(MockConnectInfo(SocketAddr::from(([10, 0, 0, 5], 1))));

    let payload = committed();
    let request = assumption_request()
        .header("x-api-key", KEY)
        .body(Body::from(payload.to_string()))
        .unwrap();
    app.clone().oneshot(request).await.unwrap();

    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = read_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["driver"], json!("sqlite"));
    assert_eq!(body["metrics"]["succeeded"], json!(1));
    assert_eq!(body["metrics"]["matched"], json!(1));
}
