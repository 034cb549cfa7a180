#![allow(clippy::doc_markdown)]
//! Integration tests for the `FleetQL` REST API.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use fleetql_core::{FilterEngine, MemoryStore};
use fleetql_server::{router, AppState};

/// Helper to create a test app over a small seeded fleet
fn create_test_app() -> Router {
    let store = MemoryStore::new();
    store
        .load_seed(&json!({
            "targettags": [{ "id": 1, "name": "canary" }],
            "targets": [
                { "id": 1, "controllerId": "dev-1", "name": "edge-a", "updateStatus": "in_sync" },
                { "id": 2, "controllerId": "dev-2", "name": "edge-b", "updateStatus": "error" },
                { "id": 3, "controllerId": "dev-3", "name": "core-c", "updateStatus": "pending" }
            ],
            "targetfilters": [{ "id": 1, "name": "edge", "query": "name==edge*" }]
        }))
        .expect("Failed to seed store");
    let state = Arc::new(AppState {
        engine: FilterEngine::default(),
        store,
    });
    router(state)
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.expect("Request failed");
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).expect("Invalid JSON")
    };
    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("Failed to build request")
}

fn with_json(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("Failed to build request")
}

fn ids(json: &Value) -> Vec<i64> {
    json["content"]
        .as_array()
        .expect("content array")
        .iter()
        .filter_map(|d| d["id"].as_i64())
        .collect()
}

#[tokio::test]
async fn test_health_check() {
    let (status, json) = send(create_test_app(), get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn test_list_with_filter_and_paging() {
    // Arrange
    let app = create_test_app();

    // Act
    let (status, json) = send(
        app,
        get("/rest/v1/targets?q=name%3D%3Dedge*&limit=1&offset=1&sort=name:DESC"),
    )
    .await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total"], 2);
    assert_eq!(json["size"], 1);
    assert_eq!(ids(&json), vec![1]);
}

#[tokio::test]
async fn test_list_without_query_returns_all() {
    let (status, json) = send(create_test_app(), get("/rest/v1/targets")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&json), vec![1, 2, 3]);
}

#[tokio::test]
async fn test_repeated_sort_parameters() {
    let (status, json) = send(
        create_test_app(),
        get("/rest/v1/targets?sort=updateStatus:ASC&sort=name:DESC"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&json), vec![2, 1, 3]);
}

#[tokio::test]
async fn test_malformed_query_is_bad_request() {
    let (status, json) = send(create_test_app(), get("/rest/v1/targets?q=name%3D%3D")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["errorCode"], "FQL-001");
    assert_eq!(json["exceptionClass"], "MalformedQuery");
    assert!(json["info"]["position"].is_u64());
}

#[tokio::test]
async fn test_unknown_field_is_bad_request() {
    let (status, json) = send(
        create_test_app(),
        get("/rest/v1/targets?q=securityToken%3D%3Dabc"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["errorCode"], "FQL-002");
    assert_eq!(json["info"]["field"], "securityToken");
}

#[tokio::test]
async fn test_unknown_sort_field_is_bad_request() {
    let (status, json) = send(create_test_app(), get("/rest/v1/targets?sort=nope:ASC")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["errorCode"], "FQL-002");
}

#[tokio::test]
async fn test_unknown_collection_is_not_found() {
    let (status, json) = send(create_test_app(), get("/rest/v1/widgets")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["errorCode"], "FQL-003");
}

#[tokio::test]
async fn test_get_entity() {
    let (status, json) = send(create_test_app(), get("/rest/v1/targets/2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["controllerId"], "dev-2");

    let (status, json) = send(create_test_app(), get("/rest/v1/targets/99")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["message"], "[FQL-003] Target not found: [99]");
}

#[tokio::test]
async fn test_assign_fail_policy_reports_missing() {
    // Arrange
    let app = create_test_app();
    let body = json!({ "keys": [1, 2, 3, 4, 5] });

    // Act
    let (status, json) = send(
        app.clone(),
        with_json("POST", "/rest/v1/targettags/1/assigned", &body),
    )
    .await;

    // Assert
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["info"]["ids"], json!(["4", "5"]));
    let (_, tagged) = send(app, get("/rest/v1/targets?q=tag%3D%3Dcanary")).await;
    assert_eq!(tagged["total"], 0);
}

#[tokio::test]
async fn test_assign_apply_and_succeed() {
    // Arrange
    let app = create_test_app();
    let body = json!({ "keys": [1, "dev-2", 3, 4, 5] });

    // Act
    let (status, json) = send(
        app.clone(),
        with_json(
            "POST",
            "/rest/v1/targettags/1/assigned?onNotFoundPolicy=ON_WHAT_FOUND_AND_SUCCESS",
            &body,
        ),
    )
    .await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["applied"], json!([1, 2, 3]));
    assert_eq!(json["changed"], 3);
    assert_eq!(json, json!({ "applied": [1, 2, 3], "changed": 3 }));
    let (_, tagged) = send(app, get("/rest/v1/targets?q=tag%3D%3Dcanary")).await;
    assert_eq!(ids(&tagged), vec![1, 2, 3]);
}

#[tokio::test]
async fn test_unassign_and_invalid_policy() {
    let app = create_test_app();
    let body = json!({ "keys": [1] });

    let (status, _) = send(
        app.clone(),
        with_json("POST", "/rest/v1/targettags/1/assigned", &body),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = send(
        app.clone(),
        with_json("DELETE", "/rest/v1/targettags/1/assigned", &body),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["changed"], 1);

    let (status, json) = send(
        app,
        with_json("DELETE", "/rest/v1/targettags/1/assigned?onNotFoundPolicy=IGNORE", &body),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["errorCode"], "FQL-004");
}

#[tokio::test]
async fn test_create_tag_validates() {
    let app = create_test_app();

    let (status, json) = send(
        app.clone(),
        with_json(
            "POST",
            "/rest/v1/targettags",
            &json!({ "name": "beta", "colour": "#00FF00" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["id"], 2);
    assert_eq!(json["name"], "beta");

    let (status, json) = send(
        app,
        with_json("POST", "/rest/v1/targettags", &json!({ "name": "x", "colour": "green" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["errorCode"], "FQL-004");
}

#[tokio::test]
async fn test_create_is_limited_to_supported_collections() {
    let (status, json) = send(
        create_test_app(),
        with_json("POST", "/rest/v1/actions", &json!({ "status": "running" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["exceptionClass"], "Validation");
}

#[tokio::test]
async fn test_filter_query_lifecycle() {
    // Arrange
    let app = create_test_app();
    let body = json!({ "name": "errors", "query": "updateStatus==error" });

    // Act
    let (status, created) = send(
        app.clone(),
        with_json("POST", "/rest/v1/targetfilters", &body),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let uri = format!("/rest/v1/targetfilters/{}/targets", created["id"]);
    let (status, json) = send(app, get(&uri)).await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&json), vec![2]);
}

#[tokio::test]
async fn test_seeded_filter_query_targets_are_paged() {
    let (status, json) = send(
        create_test_app(),
        get("/rest/v1/targetfilters/1/targets?limit=1&sort=controllerId:DESC"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total"], 2);
    assert_eq!(ids(&json), vec![2]);
}

#[tokio::test]
async fn test_invalid_filter_query_is_rejected_on_create() {
    let (status, json) = send(
        create_test_app(),
        with_json(
            "POST",
            "/rest/v1/targetfilters",
            &json!({ "name": "bad", "query": "name=lt" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["errorCode"], "FQL-001");
}

#[tokio::test]
async fn test_targets_of_non_filter_collection_is_rejected() {
    let (status, _) = send(create_test_app(), get("/rest/v1/targets/1/targets")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}
