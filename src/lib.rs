//! # SmartBin Backend
//!
//! Backend API for physical collection containers ("bins"), their assignment
//! to users, and read access to that assignment graph.
//!
//! Mutating routes and per-user reads are gated by bearer-token
//! authentication against Firebase; the global bin inventory is public.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`identity`] - `TokenVerifier` trait and the Firebase ID token verifier
//! - [`store`] - `ResourceStore` trait with Postgres and in-memory backends
//! - [`service`] - Bin and assignment services with request validation
//! - [`server`] - Axum-based HTTP server, auth middleware and routes
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use smartbin_backend::{create_router, FirebaseVerifier, MemoryStore, RouterConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = Arc::new(MemoryStore::new());
//!     let verifier = FirebaseVerifier::new("my-project", Duration::from_secs(5))
//!         .expect("http client");
//!     let router = create_router(store, Arc::new(verifier), RouterConfig::new());
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:5000").await.unwrap();
//!     axum::serve(listener, router).await.unwrap();
//! }
//! ```

pub mod config;
pub mod error;
pub mod identity;
pub mod server;
pub mod service;
pub mod store;

// Re-export commonly used types
pub use config::Config;
pub use error::{StoreError, ValidationError, VerifyError};
pub use identity::{FirebaseVerifier, Principal, TokenVerifier};
pub use server::{
    create_router, AppState, AuthError, AuthenticatedUser, BearerAuth, ErrorResponse,
    RouterConfig,
};
pub use service::{
    AssignBinRequest, AssignmentService, BinService, CreateBinRequest, ServiceError,
};
pub use store::{
    create_pool, run_migrations, Assignment, Bin, MemoryStore, NewAssignment, NewBin, PgStore,
    ResourceStore,
};
