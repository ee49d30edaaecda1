//! Bin assignment integration tests.
//!
//! Tests verify:
//! - Assigning a bin makes it visible in the user's bin list
//! - Unknown users get an empty list
//! - Invalid assignment bodies are rejected
//! - Assignments to missing bins fail without side effects

use std::sync::Arc;

use axum::http::StatusCode;
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::test_utils::{
    bin_body, body_json, get_with_token, post_json, post_raw, router_with_store, test_router,
    FailingStore,
};

async fn create_bin(router: &Router, name: &str) -> Value {
    let response = router
        .clone()
        .oneshot(post_json("/bins", Some("token-alice"), &bin_body(name)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

async fn assign(router: &Router, body: Value) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(post_json("/assign-bin", Some("token-alice"), &body))
        .await
        .unwrap();
    let status = response.status();
    (status, body_json(response).await)
}

async fn user_bins(router: &Router, user_id: &str) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(get_with_token(&format!("/user-bins/{}", user_id), "token-bob"))
        .await
        .unwrap();
    let status = response.status();
    (status, body_json(response).await)
}

// =============================================================================
// Assign and Read Back
// =============================================================================

#[tokio::test]
async fn test_assign_then_list_user_bins() {
    let (router, _store) = test_router();
    let bin = create_bin(&router, "Bin A").await;
    create_bin(&router, "Bin B").await;

    let (status, assignment) = assign(&router, json!({"user_id": "u1", "bin_id": bin["id"]})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(assignment, json!({"id": 1, "user_id": "u1", "bin_id": 1}));

    let (status, bins) = user_bins(&router, "u1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bins, json!([bin]));
}

#[tokio::test]
async fn test_user_bins_unknown_user_is_empty() {
    let (router, _store) = test_router();
    create_bin(&router, "Bin A").await;

    let (status, bins) = user_bins(&router, "nobody").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bins, json!([]));
}

#[tokio::test]
async fn test_user_bins_only_returns_that_users_bins() {
    let (router, _store) = test_router();
    let a = create_bin(&router, "Bin A").await;
    let b = create_bin(&router, "Bin B").await;

    assign(&router, json!({"user_id": "u1", "bin_id": a["id"]})).await;
    assign(&router, json!({"user_id": "u2", "bin_id": b["id"]})).await;

    let (_, u1) = user_bins(&router, "u1").await;
    let (_, u2) = user_bins(&router, "u2").await;
    assert_eq!(u1, json!([a]));
    assert_eq!(u2, json!([b]));
}

#[tokio::test]
async fn test_duplicate_assignment_listed_twice() {
    let (router, store) = test_router();
    let bin = create_bin(&router, "Bin A").await;

    for _ in 0..2 {
        let (status, _) = assign(&router, json!({"user_id": "u1", "bin_id": bin["id"]})).await;
        assert_eq!(status, StatusCode::OK);
    }

    assert_eq!(store.assignment_count().await, 2);
    let (_, bins) = user_bins(&router, "u1").await;
    assert_eq!(bins.as_array().unwrap().len(), 2);
}

// =============================================================================
// Validation
// =============================================================================

#[tokio::test]
async fn test_assign_requires_user_id() {
    let (router, _store) = test_router();
    create_bin(&router, "Bin A").await;

    let (status, body) = assign(&router, json!({"bin_id": 1})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required field: user_id");

    let (status, body) = assign(&router, json!({"user_id": " ", "bin_id": 1})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Field must not be empty: user_id");
}

#[tokio::test]
async fn test_assign_rejects_bad_bin_id() {
    let (router, store) = test_router();

    let (status, body) = assign(&router, json!({"user_id": "u1"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required field: bin_id");

    for bin_id in [0_i64, -4, 4_294_967_296] {
        let (status, body) = assign(&router, json!({"user_id": "u1", "bin_id": bin_id})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", bin_id);
        assert_eq!(
            body["error"],
            format!("Invalid bin_id {}: must be a positive integer", bin_id)
        );
    }

    assert_eq!(store.assignment_count().await, 0);
}

#[tokio::test]
async fn test_assign_non_numeric_bin_id_is_invalid_body() {
    let (router, _store) = test_router();

    let response = router
        .oneshot(post_raw(
            "/assign-bin",
            Some("token-alice"),
            r#"{"user_id": "u1", "bin_id": "seven"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({"error": "Invalid request body"})
    );
}

// =============================================================================
// Store Failures
// =============================================================================

#[tokio::test]
async fn test_assign_missing_bin_fails_without_side_effects() {
    let (router, store) = test_router();

    let (status, body) = assign(&router, json!({"user_id": "u1", "bin_id": 99})).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Failed to assign bin"}));

    assert_eq!(store.assignment_count().await, 0);
    let (_, bins) = user_bins(&router, "u1").await;
    assert_eq!(bins, json!([]));
}

#[tokio::test]
async fn test_store_failure_messages() {
    let router = router_with_store(Arc::new(FailingStore));

    let (status, body) = assign(&router, json!({"user_id": "u1", "bin_id": 1})).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Failed to assign bin"}));

    let (status, body) = user_bins(&router, "u1").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Failed to fetch user bins"}));
}
