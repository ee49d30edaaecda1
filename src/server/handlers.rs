//! HTTP request handlers for the SmartBin API.
//!
//! # Endpoints
//!
//! - `GET /` - Liveness text
//! - `GET /health` - Liveness JSON
//! - `GET /profile` - Echo the verified principal (protected)
//! - `POST /bins` - Create a bin (protected)
//! - `GET /bins` - List every bin
//! - `POST /assign-bin` - Assign a bin to a user (protected)
//! - `GET /user-bins/{user_id}` - Bins assigned to a user (protected)

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::error::StoreError;
use crate::identity::Principal;
use crate::service::{
    AssignBinRequest, AssignmentService, BinService, CreateBinRequest, ServiceError,
};
use crate::store::{Assignment, Bin, ResourceStore};

use super::auth::AuthenticatedUser;

/// Body of `GET /`.
pub const LIVENESS_TEXT: &str = "SmartBin Backend is running";

// =============================================================================
// Application State
// =============================================================================

/// Shared application state containing the services.
///
/// This is passed to all handlers via Axum's State extractor.
pub struct AppState<S: ResourceStore> {
    /// Bin creation and listing
    pub bins: BinService<S>,

    /// Assignment creation and per-user listing
    pub assignments: AssignmentService<S>,
}

impl<S: ResourceStore> AppState<S> {
    /// Create state with both services backed by the same store.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            bins: BinService::new(Arc::clone(&store)),
            assignments: AssignmentService::new(store),
        }
    }
}

impl<S: ResourceStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            bins: self.bins.clone(),
            assignments: self.assignments.clone(),
        }
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Client-facing error message
    pub error: String,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
}

/// Response from the profile endpoint.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub message: String,

    /// The verified principal and its claims
    pub user: Principal,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Fixed client messages for store failures, one per endpoint.
pub const ADD_BIN_FAILED: &str = "Failed to add bin";
pub const FETCH_BINS_FAILED: &str = "Failed to fetch bins";
pub const ASSIGN_BIN_FAILED: &str = "Failed to assign bin";
pub const FETCH_USER_BINS_FAILED: &str = "Failed to fetch user bins";

/// Client message for bodies that are not valid JSON of the expected shape.
pub const INVALID_BODY: &str = "Invalid request body";

/// Handler error carrying the response it maps to.
#[derive(Debug)]
pub enum ApiError {
    /// 400 with the given message
    BadRequest(String),

    /// 500 with a fixed endpoint message; the store detail is only logged
    Store {
        message: &'static str,
        source: StoreError,
    },
}

impl ApiError {
    /// Map a service failure, using `store_message` if the store failed.
    pub fn from_service(err: ServiceError, store_message: &'static str) -> Self {
        match err {
            ServiceError::Validation(e) => ApiError::BadRequest(e.to_string()),
            ServiceError::Store(source) => ApiError::Store {
                message: store_message,
                source,
            },
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!(reason = %rejection.body_text(), "Rejected request body");
        ApiError::BadRequest(INVALID_BODY.to_string())
    }
}

/// Convert ApiError to HTTP response.
///
/// - 4xx errors are logged at WARN level (client errors)
/// - 5xx errors are logged at ERROR level with the store detail
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => {
                warn!(
                    error_type = "bad_request",
                    status = StatusCode::BAD_REQUEST.as_u16(),
                    "Client error: {}",
                    message
                );
                (StatusCode::BAD_REQUEST, message)
            }
            ApiError::Store { message, source } => {
                error!(
                    error_type = store_error_type(&source),
                    status = StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
                    detail = %source,
                    "Server error: {}",
                    message
                );
                (StatusCode::INTERNAL_SERVER_ERROR, message.to_string())
            }
        };

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

fn store_error_type(err: &StoreError) -> &'static str {
    match err {
        StoreError::Database(_) => "database",
        StoreError::ForeignKey(_) => "foreign_key",
        StoreError::Timeout(_) => "timeout",
        StoreError::Pool(_) => "pool",
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// `GET /` - plain-text liveness.
pub async fn root_handler() -> &'static str {
    LIVENESS_TEXT
}

/// `GET /health` - JSON liveness.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// `GET /profile` - echo the verified principal.
pub async fn profile_handler(
    AuthenticatedUser(user): AuthenticatedUser,
) -> Json<ProfileResponse> {
    Json(ProfileResponse {
        message: "Token is valid".to_string(),
        user,
    })
}

/// Handle bin creation.
///
/// # Endpoint
///
/// `POST /bins` with body `{name, location, status, date}`
///
/// # Response
///
/// - `201 Created`: the inserted row including its generated `id`
/// - `400 Bad Request`: missing/blank field, bad date, or unparseable body
/// - `500 Internal Server Error`: `{"error":"Failed to add bin"}`
pub async fn create_bin_handler<S: ResourceStore>(
    State(state): State<AppState<S>>,
    AuthenticatedUser(user): AuthenticatedUser,
    body: Result<Json<CreateBinRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Bin>), ApiError> {
    let Json(request) = body?;
    debug!(uid = %user.uid, "Creating bin");

    let bin = state
        .bins
        .create(request)
        .await
        .map_err(|e| ApiError::from_service(e, ADD_BIN_FAILED))?;

    Ok((StatusCode::CREATED, Json(bin)))
}

/// `GET /bins` - every bin, no authentication required.
pub async fn list_bins_handler<S: ResourceStore>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<Bin>>, ApiError> {
    let bins = state
        .bins
        .list()
        .await
        .map_err(|e| ApiError::from_service(e, FETCH_BINS_FAILED))?;
    Ok(Json(bins))
}

/// Handle bin assignment.
///
/// # Endpoint
///
/// `POST /assign-bin` with body `{user_id, bin_id}`
///
/// # Response
///
/// - `200 OK`: the inserted assignment row
/// - `400 Bad Request`: missing/blank `user_id`, non-positive `bin_id`, or unparseable body
/// - `500 Internal Server Error`: `{"error":"Failed to assign bin"}`, including
///   when `bin_id` references no bin
pub async fn assign_bin_handler<S: ResourceStore>(
    State(state): State<AppState<S>>,
    AuthenticatedUser(user): AuthenticatedUser,
    body: Result<Json<AssignBinRequest>, JsonRejection>,
) -> Result<Json<Assignment>, ApiError> {
    let Json(request) = body?;
    debug!(uid = %user.uid, "Assigning bin");

    let assignment = state
        .assignments
        .assign(request)
        .await
        .map_err(|e| ApiError::from_service(e, ASSIGN_BIN_FAILED))?;
    Ok(Json(assignment))
}

/// `GET /user-bins/{user_id}` - bins assigned to a user, possibly empty.
///
/// Any authenticated caller may read any user's assignments.
pub async fn user_bins_handler<S: ResourceStore>(
    State(state): State<AppState<S>>,
    AuthenticatedUser(_user): AuthenticatedUser,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Bin>>, ApiError> {
    let bins = state
        .assignments
        .list_bins_for_user(&user_id)
        .await
        .map_err(|e| ApiError::from_service(e, FETCH_USER_BINS_FAILED))?;
    Ok(Json(bins))
}

// =============================================================================
// Tests
// =============================================================================
