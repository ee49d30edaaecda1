//! Bearer-token authentication for protected routes.
//!
//! Protected requests must carry `Authorization: Bearer <token>`. The token is
//! handed to a [`TokenVerifier`]; on success the resulting [`Principal`] is
//! attached to the request and handlers read it through [`AuthenticatedUser`].
//!
//! # Rejections
//!
//! | Condition | Status | Body |
//! |---|---|---|
//! | header absent, not UTF-8, or no token segment | 401 | `{"error":"No token provided"}` |
//! | scheme is not `Bearer`, or verification fails for any reason | 401 | `{"error":"Invalid token"}` |
//!
//! All verification failures share one response body. The underlying reason
//! is logged.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, warn};

use crate::error::VerifyError;
use crate::identity::{Principal, TokenVerifier};

use super::handlers::ErrorResponse;

/// Default bound on a single token verification.
pub const DEFAULT_VERIFY_TIMEOUT: Duration = Duration::from_secs(5);

// =============================================================================
// Types
// =============================================================================

/// Authentication error types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// No usable bearer token on the request
    MissingToken,

    /// A token was supplied but did not verify
    InvalidToken,
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingToken => write!(f, "No token provided"),
            AuthError::InvalidToken => write!(f, "Invalid token"),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = StatusCode::UNAUTHORIZED;
        debug!(status = status.as_u16(), "Authentication failed: {}", self);
        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

// =============================================================================
// Bearer Extraction
// =============================================================================

/// Pull the token out of an `Authorization` header value.
///
/// The value is split on whitespace; the second segment is the token.
pub fn extract_bearer(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::MissingToken)?;
    let mut parts = header.split_whitespace();
    let scheme = parts.next().ok_or(AuthError::MissingToken)?;
    let token = parts.next().ok_or(AuthError::MissingToken)?;

    if !scheme.eq_ignore_ascii_case("bearer") || parts.next().is_some() {
        return Err(AuthError::InvalidToken);
    }
    Ok(token)
}

// =============================================================================
// Bearer Authenticator
// =============================================================================

/// Verifies `Authorization` header values against a [`TokenVerifier`].
#[derive(Clone)]
pub struct BearerAuth {
    verifier: Arc<dyn TokenVerifier>,
    timeout: Duration,
}

impl BearerAuth {
    /// Create an authenticator with the default verification timeout.
    pub fn new(verifier: Arc<dyn TokenVerifier>) -> Self {
        Self {
            verifier,
            timeout: DEFAULT_VERIFY_TIMEOUT,
        }
    }

    /// Bound each verification call by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Verify a raw `Authorization` header value.
    ///
    /// Every verification failure, including a timeout, becomes
    /// [`AuthError::InvalidToken`].
    pub async fn verify(&self, header: Option<&str>) -> Result<Principal, AuthError> {
        let token = extract_bearer(header)?;

        let verification = self.verifier.verify_token(token);
        let result = match tokio::time::timeout(self.timeout, verification).await {
            Ok(result) => result,
            Err(_) => Err(VerifyError::Timeout),
        };

        result.map_err(|err| {
            match &err {
                VerifyError::Expired => debug!(reason = %err, "Token rejected"),
                _ => warn!(reason = %err, "Token rejected"),
            }
            AuthError::InvalidToken
        })
    }
}

// =============================================================================
// Axum Middleware
// =============================================================================

/// Axum middleware requiring a verified bearer token.
///
/// On success the [`Principal`] is stored in the request extensions.
///
/// ```ignore
/// let auth = BearerAuth::new(verifier);
/// let app = Router::new()
///     .route("/profile", get(profile_handler))
///     .route_layer(middleware::from_fn_with_state(auth, auth_middleware));
/// ```
pub async fn auth_middleware(
    State(auth): State<BearerAuth>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    let principal = auth.verify(header.as_deref()).await?;
    debug!(uid = %principal.uid, "Request authenticated");

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

/// Extractor for the principal attached by [`auth_middleware`].
///
/// Rejects with [`AuthError::MissingToken`] on routes the middleware did not
/// run for.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Principal);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .map(AuthenticatedUser)
            .ok_or(AuthError::MissingToken)
    }
}

// =============================================================================
// Tests
// =============================================================================
