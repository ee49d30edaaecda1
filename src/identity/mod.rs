//! Identity verification layer.
//!
//! Maps a raw bearer token to a [`Principal`] using an external identity
//! provider. The HTTP layer only depends on the [`TokenVerifier`] trait, so
//! tests and alternative providers can be plugged in without touching routes.
//!
//! ```text
//! ┌───────────────────────────────┐
//! │       auth middleware         │
//! └──────────────┬────────────────┘
//!                │ token
//!                ▼
//! ┌───────────────────────────────┐
//! │     TokenVerifier trait       │
//! └──────────────┬────────────────┘
//!                ▼
//! ┌───────────────────────────────┐
//! │       FirebaseVerifier        │
//! │  (JWKS fetch + RS256 check)   │
//! └───────────────────────────────┘
//! ```

mod firebase;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::VerifyError;

pub use firebase::{parse_max_age, FirebaseVerifier, GOOGLE_JWKS_URL, MAX_UID_LENGTH};

/// A verified identity attached to a request.
///
/// `uid` is the token subject. The remaining verified claims are kept so they
/// can be echoed back by the profile endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Principal {
    /// Opaque subject identifier from the verified token
    pub uid: String,

    /// Every other claim of the verified token
    #[serde(flatten)]
    pub claims: Map<String, Value>,
}

impl Principal {
    /// Create a principal with no extra claims.
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            claims: Map::new(),
        }
    }

    /// Build a principal from a verified claim set, taking `uid` from `sub`.
    pub fn from_claims(mut claims: Map<String, Value>) -> Result<Self, VerifyError> {
        let uid = match claims.get("sub") {
            Some(Value::String(sub)) if !sub.is_empty() => sub.clone(),
            _ => return Err(VerifyError::Claims("sub must be a non-empty string".into())),
        };
        // `uid` is serialized from the field; a claim of the same name would
        // produce a duplicate key.
        claims.remove("uid");

        Ok(Self { uid, claims })
    }
}

/// Validates bearer tokens against an identity provider.
///
/// Implementations must not mutate shared state visible to callers; concurrent
/// verifications are independent.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Verify a raw token (without the `Bearer ` prefix).
    async fn verify_token(&self, token: &str) -> Result<Principal, VerifyError>;
}
