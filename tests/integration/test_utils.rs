//! Test utilities for integration tests.
//!
//! This module provides mock verifiers and stores, router builders and
//! request helpers shared by the integration suites.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};

use smartbin_backend::error::{StoreError, VerifyError};
use smartbin_backend::identity::{FirebaseVerifier, Principal, TokenVerifier};
use smartbin_backend::store::{
    Assignment, Bin, MemoryStore, NewAssignment, NewBin, ResourceStore,
};
use smartbin_backend::{create_router, RouterConfig};

pub const TEST_PROJECT: &str = "smartbin-test";
pub const TEST_KID: &str = "smartbin-test-key";

const SIGNING_KEY: &str = include_str!("../fixtures/test_signing_key.pem");
const JWKS: &str = include_str!("../fixtures/test_jwks.json");

// =============================================================================
// Mock Token Verifier
// =============================================================================

/// A verifier that accepts a fixed set of tokens.
///
/// Counts every call so tests can assert that public routes never verify.
#[derive(Default)]
pub struct MockVerifier {
    tokens: HashMap<String, String>,
    calls: AtomicUsize,
}

impl MockVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `token` as the identity `uid`.
    pub fn with_token(mut self, token: impl Into<String>, uid: impl Into<String>) -> Self {
        self.tokens.insert(token.into(), uid.into());
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenVerifier for MockVerifier {
    async fn verify_token(&self, token: &str) -> Result<Principal, VerifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.tokens.get(token) {
            Some(uid) => Ok(Principal::new(uid.clone())),
            None => Err(VerifyError::Signature),
        }
    }
}

// =============================================================================
// Failing Store
// =============================================================================

/// A store whose every operation fails.
pub struct FailingStore;

fn unavailable() -> StoreError {
    StoreError::Database("connection refused".to_string())
}

#[async_trait]
impl ResourceStore for FailingStore {
    async fn insert_bin(&self, _bin: NewBin) -> Result<Bin, StoreError> {
        Err(unavailable())
    }

    async fn list_bins(&self) -> Result<Vec<Bin>, StoreError> {
        Err(unavailable())
    }

    async fn insert_assignment(
        &self,
        _assignment: NewAssignment,
    ) -> Result<Assignment, StoreError> {
        Err(unavailable())
    }

    async fn bins_for_user(&self, _user_id: &str) -> Result<Vec<Bin>, StoreError> {
        Err(unavailable())
    }
}

// =============================================================================
// Router Builders
// =============================================================================

/// Router over `store` that accepts `token-alice` and `token-bob`.
pub fn router_with_store<S: ResourceStore + 'static>(store: Arc<S>) -> Router {
    let verifier = MockVerifier::new()
        .with_token("token-alice", "alice")
        .with_token("token-bob", "bob");
    create_router(store, Arc::new(verifier), test_config())
}

/// Router over an empty in-memory store.
pub fn test_router() -> (Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    (router_with_store(Arc::clone(&store)), store)
}

/// Router config with request tracing disabled.
pub fn test_config() -> RouterConfig {
    RouterConfig::new().with_tracing(false)
}

// =============================================================================
// Firebase Token Helpers
// =============================================================================

/// Firebase verifier trusting only the fixture key.
pub fn fixture_verifier() -> FirebaseVerifier {
    let keys: JwkSet = serde_json::from_str(JWKS).unwrap();
    FirebaseVerifier::with_static_keys(TEST_PROJECT, keys)
}

pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}

/// Serve a key endpoint that always answers with `status`, returning its URL.
pub async fn serve_key_endpoint(status: StatusCode) -> String {
    let app = Router::new().route(
        "/keys",
        axum::routing::get(move || async move { (status, JWKS) }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}/keys", addr)
}

/// Claims of a fresh ID token for `sub` issued for the test project.
pub fn id_token_claims(sub: &str) -> Value {
    let now = unix_now();
    json!({
        "iss": format!("https://securetoken.google.com/{}", TEST_PROJECT),
        "aud": TEST_PROJECT,
        "sub": sub,
        "iat": now - 30,
        "auth_time": now - 30,
        "exp": now + 3600,
        "email": format!("{}@example.com", sub),
        "firebase": {"sign_in_provider": "password"},
    })
}

/// Sign `claims` with the fixture key.
pub fn sign_id_token(claims: &Value) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(TEST_KID.to_string());
    let key = EncodingKey::from_rsa_pem(SIGNING_KEY.as_bytes()).unwrap();
    encode(&header, claims, &key).unwrap()
}

// =============================================================================
// Request Helpers
// =============================================================================

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn get_with_token(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

pub fn post_json(uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    post_raw(uri, token, body.to_string())
}

pub fn post_raw(uri: &str, token: Option<&str>, body: impl Into<String>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.into())).unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// A valid create-bin body.
pub fn bin_body(name: &str) -> Value {
    json!({
        "name": name,
        "location": "Dock 3",
        "status": "empty",
        "date": "2024-05-01",
    })
}
