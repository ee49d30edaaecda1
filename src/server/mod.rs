//! HTTP server layer for the SmartBin API.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │                                                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────────┐  │
//! │  │  handlers   │  │    auth     │  │        routes           │  │
//! │  │ (requests)  │  │  (bearer)   │  │  (router config)        │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod handlers;
pub mod routes;

pub use auth::{auth_middleware, extract_bearer, AuthError, AuthenticatedUser, BearerAuth};
pub use handlers::{
    assign_bin_handler, create_bin_handler, health_handler, list_bins_handler, profile_handler,
    root_handler, user_bins_handler, ApiError, AppState, ErrorResponse, HealthResponse,
    ProfileResponse,
};
pub use routes::{create_router, RouterConfig};
