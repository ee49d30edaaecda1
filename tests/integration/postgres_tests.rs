//! Postgres store integration tests.
//!
//! These tests need a real database and are ignored by default. Run them with:
//!
//! ```text
//! SMARTBIN_TEST_DATABASE_URL=postgres://localhost/smartbin_test \
//!     cargo test --test integration -- --ignored
//! ```
//!
//! Migrations are applied on connect. Each test uses its own user ids so the
//! suite can run against a shared database.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::http::StatusCode;
use chrono::NaiveDate;
use serde_json::json;
use tower::ServiceExt;

use smartbin_backend::error::StoreError;
use smartbin_backend::store::{
    create_pool, run_migrations, NewAssignment, NewBin, PgStore, ResourceStore,
};

use super::test_utils::{bin_body, body_json, get_with_token, post_json, router_with_store};

const DATABASE_URL_VAR: &str = "SMARTBIN_TEST_DATABASE_URL";

async fn connect() -> PgStore {
    let url = std::env::var(DATABASE_URL_VAR)
        .unwrap_or_else(|_| panic!("{} must be set for Postgres tests", DATABASE_URL_VAR));
    let pool = create_pool(&url, 2, Duration::from_secs(5)).await.unwrap();
    run_migrations(&pool).await.unwrap();
    PgStore::new(pool, Duration::from_secs(5))
}

fn unique_user(prefix: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}-{}", prefix, nanos)
}

fn new_bin(name: &str) -> NewBin {
    NewBin {
        name: name.to_string(),
        location: "Dock 3".to_string(),
        status: "empty".to_string(),
        date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
    }
}

#[tokio::test]
#[ignore]
async fn test_pg_insert_and_list_bins() {
    let store = connect().await;

    let bin = store.insert_bin(new_bin("Pg Bin")).await.unwrap();
    assert!(bin.id > 0);
    assert_eq!(bin.name, "Pg Bin");

    let bins = store.list_bins().await.unwrap();
    assert!(bins.contains(&bin));
    assert!(bins.windows(2).all(|pair| pair[0].id < pair[1].id));
}

#[tokio::test]
#[ignore]
async fn test_pg_assignment_round_trip() {
    let store = connect().await;
    let user = unique_user("pg-user");

    let bin = store.insert_bin(new_bin("Pg Assigned")).await.unwrap();
    let assignment = store
        .insert_assignment(NewAssignment {
            user_id: user.clone(),
            bin_id: bin.id,
        })
        .await
        .unwrap();
    assert_eq!(assignment.user_id, user);
    assert_eq!(assignment.bin_id, bin.id);

    let bins = store.bins_for_user(&user).await.unwrap();
    assert_eq!(bins, vec![bin]);

    let none = store.bins_for_user(&unique_user("pg-nobody")).await.unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
#[ignore]
async fn test_pg_missing_bin_is_foreign_key_error() {
    let store = connect().await;
    let user = unique_user("pg-fk");

    let result = store
        .insert_assignment(NewAssignment {
            user_id: user.clone(),
            bin_id: i32::MAX,
        })
        .await;
    assert!(matches!(result, Err(StoreError::ForeignKey(_))));
    assert!(store.bins_for_user(&user).await.unwrap().is_empty());
}

#[tokio::test]
#[ignore]
async fn test_pg_router_end_to_end() {
    let router = router_with_store(Arc::new(connect().await));
    let user = unique_user("pg-http");

    let response = router
        .clone()
        .oneshot(post_json("/bins", Some("token-alice"), &bin_body("Pg Http")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let bin = body_json(response).await;

    let response = router
        .clone()
        .oneshot(post_json(
            "/assign-bin",
            Some("token-alice"),
            &json!({"user_id": user, "bin_id": bin["id"]}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .oneshot(get_with_token(&format!("/user-bins/{}", user), "token-bob"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!([bin]));
}
