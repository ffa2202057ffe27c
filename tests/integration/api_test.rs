// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::{Extension, Router};
use monitrs::application::commands::CommandService;
use monitrs::infrastructure::repositories::memory_state_store::InMemoryStateStore;
use monitrs::infrastructure::repositories::memory_target_repo::InMemoryTargetRepository;
use monitrs::presentation::routes;
use monitrs::queue::memory_queue::InMemoryWorkQueue;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use uuid::Uuid;

struct Api {
    app: Router,
    queue: Arc<InMemoryWorkQueue>,
}

fn api() -> Api {
    let targets = Arc::new(InMemoryTargetRepository::new());
    let store = Arc::new(InMemoryStateStore::new());
    let queue = InMemoryWorkQueue::new(Duration::from_secs(30), 3);
    let commands = Arc::new(CommandService::new(targets, store, queue.clone()));

    Api {
        app: routes::routes().layer(Extension(commands)),
        queue,
    }
}

fn register_payload() -> Value {
    json!({
        "name": "listing",
        "url": "http://site.test/listing",
        "poll_interval_secs": 300,
        "rules": [
            {
                "name": "price",
                "selector": { "kind": "css", "selector": ".price" },
                "value_type": "number",
                "required": true
            }
        ]
    })
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn post_json(uri: &str, payload: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health_and_version() {
    let api = api();

    let (status, _) = send(&api.app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);

    let response = api.app.clone().oneshot(get("/v1/version")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_register_target_returns_created_with_id() {
    let api = api();

    let (status, body) = send(&api.app, post_json("/v1/targets", &register_payload())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["target_id"].as_str().unwrap().parse::<Uuid>().is_ok());
}

#[tokio::test]
async fn test_register_rejects_invalid_payload() {
    let api = api();
    let mut payload = register_payload();
    payload["url"] = json!("not a url");

    let (status, body) = send(&api.app, post_json("/v1/targets", &payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("validation"));
}

#[tokio::test]
async fn test_force_check_enqueues_and_unknown_is_404() {
    let api = api();
    let (_, body) = send(&api.app, post_json("/v1/targets", &register_payload())).await;
    let id = body["target_id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &api.app,
        post_json(&format!("/v1/targets/{}/check", id), &Value::Null),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["enqueued"], true);
    assert_eq!(api.queue.ready_len(), 1);

    let (status, _) = send(
        &api.app,
        post_json(&format!("/v1/targets/{}/check", Uuid::new_v4()), &Value::Null),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_status_for_fresh_target_has_no_snapshot() {
    let api = api();
    let (_, body) = send(&api.app, post_json("/v1/targets", &register_payload())).await;
    let id = body["target_id"].as_str().unwrap().to_string();

    let (status, body) = send(&api.app, get(&format!("/v1/targets/{}/status", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "listing");
    assert_eq!(body["active"], true);
    assert!(body["last_snapshot_version"].is_null());
    assert!(body["last_outcome"].is_null());
}

#[tokio::test]
async fn test_runs_endpoint_returns_empty_list_initially() {
    let api = api();
    let (_, body) = send(&api.app, post_json("/v1/targets", &register_payload())).await;
    let id = body["target_id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &api.app,
        get(&format!("/v1/targets/{}/runs?limit=5", id)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 0);
}
