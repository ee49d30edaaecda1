//! Router configuration for the SmartBin API.
//!
//! This module defines the HTTP routes and applies middleware for
//! authentication, CORS and request tracing.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Liveness text (public)
//! GET  /health                 - Liveness JSON (public)
//! GET  /profile                - Verified principal (protected)
//! POST /bins                   - Create bin (protected)
//! GET  /bins                   - List bins (public)
//! POST /assign-bin             - Assign bin to user (protected)
//! GET  /user-bins/{user_id}    - Bins assigned to user (protected)
//! ```
//!
//! Listing all bins is public while a user's assignments are not: global
//! inventory is open, per-user data requires a verified token.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use smartbin_backend::server::routes::{create_router, RouterConfig};
//! use smartbin_backend::store::MemoryStore;
//!
//! let store = Arc::new(MemoryStore::new());
//! let router = create_router(store, verifier, RouterConfig::new());
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:5000").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::auth::{auth_middleware, BearerAuth, DEFAULT_VERIFY_TIMEOUT};
use super::handlers::{
    assign_bin_handler, create_bin_handler, health_handler, list_bins_handler, profile_handler,
    root_handler, user_bins_handler, AppState,
};
use crate::identity::TokenVerifier;
use crate::store::ResourceStore;

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Clone, Debug)]
pub struct RouterConfig {
    /// Allowed CORS origins (None = allow any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Whether to enable request tracing
    pub enable_tracing: bool,

    /// Bound on each token verification
    pub verify_timeout: Duration,
}

impl RouterConfig {
    /// Create a router configuration with defaults.
    ///
    /// By default:
    /// - CORS allows any origin
    /// - Tracing is enabled
    /// - Token verification times out after 5 seconds
    pub fn new() -> Self {
        Self {
            cors_origins: None,
            enable_tracing: true,
            verify_timeout: DEFAULT_VERIFY_TIMEOUT,
        }
    }

    /// Set specific allowed CORS origins.
    ///
    /// Pass an empty vec to disallow all cross-origin requests.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }

    /// Set the token verification timeout.
    pub fn with_verify_timeout(mut self, timeout: Duration) -> Self {
        self.verify_timeout = timeout;
        self
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// Protected routes run [`auth_middleware`] before the handler; public routes
/// never consult the verifier.
pub fn create_router<S>(
    store: Arc<S>,
    verifier: Arc<dyn TokenVerifier>,
    config: RouterConfig,
) -> Router
where
    S: ResourceStore + 'static,
{
    let app_state = AppState::new(store);
    let auth = BearerAuth::new(verifier).with_timeout(config.verify_timeout);
    let cors = build_cors_layer(&config);

    let protected_routes = Router::new()
        .route("/profile", get(profile_handler))
        .route("/bins", post(create_bin_handler::<S>))
        .route("/assign-bin", post(assign_bin_handler::<S>))
        .route("/user-bins/{user_id}", get(user_bins_handler::<S>))
        .route_layer(middleware::from_fn_with_state(auth, auth_middleware));

    let public_routes = Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/bins", get(list_bins_handler::<S>));

    let router = Router::new()
        .merge(protected_routes)
        .merge(public_routes)
        .with_state(app_state)
        .layer(cors);

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .max_age(Duration::from_secs(86400));

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        Some(origins) if origins.is_empty() => cors,
        Some(origins) => {
            let parsed_origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed_origins)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
