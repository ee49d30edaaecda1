//! Firebase ID token verification.
//!
//! Tokens are RS256 JWTs signed by Google's `securetoken` service account.
//! Verification follows the rules the Firebase Admin SDK applies:
//!
//! - header `alg` is `RS256` and `kid` names a key in the published JWK set
//! - `aud` is the project id
//! - `iss` is `https://securetoken.google.com/{project_id}`
//! - `exp` is in the future and `iat` is not
//! - `sub` is a non-empty string of at most 128 characters
//!
//! The JWK set is fetched lazily and cached until the `max-age` advertised by
//! the key endpoint runs out.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde_json::{Map, Value};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::error::VerifyError;

use super::{Principal, TokenVerifier};

/// Public keys for Firebase ID tokens, in JWK form.
pub const GOOGLE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

/// Longest `sub` Firebase accepts.
pub const MAX_UID_LENGTH: usize = 128;

/// Key cache lifetime when the endpoint sends no usable `Cache-Control`.
const DEFAULT_KEY_TTL: Duration = Duration::from_secs(3600);

/// Clock skew tolerated on `exp`, `iat` and `auth_time`.
const CLOCK_LEEWAY_SECS: u64 = 5;

struct CachedKeys {
    set: JwkSet,
    expires_at: Instant,
}

/// Verifies Firebase ID tokens for a single project.
pub struct FirebaseVerifier {
    project_id: String,
    jwks_url: String,
    http: reqwest::Client,
    keys: RwLock<Option<CachedKeys>>,
    refresh_lock: Mutex<()>,
}

impl FirebaseVerifier {
    /// Create a verifier that fetches keys from Google.
    pub fn new(project_id: impl Into<String>, fetch_timeout: Duration) -> Result<Self, VerifyError> {
        Self::with_jwks_url(project_id, GOOGLE_JWKS_URL, fetch_timeout)
    }

    /// Create a verifier that fetches keys from a custom JWK endpoint.
    pub fn with_jwks_url(
        project_id: impl Into<String>,
        jwks_url: impl Into<String>,
        fetch_timeout: Duration,
    ) -> Result<Self, VerifyError> {
        let http = reqwest::Client::builder()
            .timeout(fetch_timeout)
            .build()
            .map_err(|e| VerifyError::KeyFetch(e.to_string()))?;

        Ok(Self {
            project_id: project_id.into(),
            jwks_url: jwks_url.into(),
            http,
            keys: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        })
    }

    /// Create a verifier with a fixed key set that is never refreshed.
    ///
    /// Used for emulators and tests where tokens are minted locally.
    pub fn with_static_keys(project_id: impl Into<String>, keys: JwkSet) -> Self {
        Self {
            project_id: project_id.into(),
            jwks_url: String::new(),
            http: reqwest::Client::new(),
            keys: RwLock::new(Some(CachedKeys {
                set: keys,
                expires_at: far_future(),
            })),
            refresh_lock: Mutex::new(()),
        }
    }

    /// The Firebase project tokens must be issued for.
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Expected `iss` claim for this project.
    pub fn issuer(&self) -> String {
        format!("https://securetoken.google.com/{}", self.project_id)
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[self.project_id.as_str()]);
        validation.set_issuer(&[self.issuer()]);
        validation.set_required_spec_claims(&["exp", "iat", "aud", "iss", "sub"]);
        validation.leeway = CLOCK_LEEWAY_SECS;
        validation
    }

    /// Resolve the decoding key for `kid`.
    ///
    /// The key set is only refetched once the cached copy has expired. An
    /// unknown `kid` against a fresh set is rejected without a fetch, and
    /// concurrent callers that find the cache stale share a single refresh.
    async fn decoding_key(&self, kid: &str) -> Result<DecodingKey, VerifyError> {
        if let Some(result) = self.cached_key(kid).await {
            return result;
        }

        let _refresh = self.refresh_lock.lock().await;
        // Another caller may have refreshed while we waited.
        if let Some(result) = self.cached_key(kid).await {
            return result;
        }

        let set = self.refresh_keys().await?;
        let jwk = set
            .find(kid)
            .ok_or_else(|| VerifyError::UnknownKey(kid.to_string()))?;
        DecodingKey::from_jwk(jwk).map_err(|e| VerifyError::Malformed(e.to_string()))
    }

    /// Look `kid` up in the cached set, or `None` if there is no fresh set.
    async fn cached_key(&self, kid: &str) -> Option<Result<DecodingKey, VerifyError>> {
        let cached = self.keys.read().await;
        let keys = cached
            .as_ref()
            .filter(|keys| keys.expires_at > Instant::now())?;

        Some(match keys.set.find(kid) {
            Some(jwk) => {
                DecodingKey::from_jwk(jwk).map_err(|e| VerifyError::Malformed(e.to_string()))
            }
            None => Err(VerifyError::UnknownKey(kid.to_string())),
        })
    }

    async fn refresh_keys(&self) -> Result<JwkSet, VerifyError> {
        if self.jwks_url.is_empty() {
            return Err(VerifyError::KeyFetch("no key endpoint configured".into()));
        }

        debug!(url = %self.jwks_url, "Fetching identity provider signing keys");

        let response = self
            .http
            .get(&self.jwks_url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| VerifyError::KeyFetch(e.to_string()))?;

        let ttl = response
            .headers()
            .get(http::header::CACHE_CONTROL)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_max_age)
            .unwrap_or(DEFAULT_KEY_TTL);

        let set: JwkSet = response
            .json()
            .await
            .map_err(|e| VerifyError::KeyFetch(e.to_string()))?;

        let mut cached = self.keys.write().await;
        *cached = Some(CachedKeys {
            set: set.clone(),
            expires_at: Instant::now() + ttl,
        });

        Ok(set)
    }
}

#[async_trait]
impl TokenVerifier for FirebaseVerifier {
    async fn verify_token(&self, token: &str) -> Result<Principal, VerifyError> {
        let header = decode_header(token).map_err(|e| VerifyError::Malformed(e.to_string()))?;

        if header.alg != Algorithm::RS256 {
            return Err(VerifyError::Malformed(format!(
                "unexpected algorithm {:?}",
                header.alg
            )));
        }
        let kid = header
            .kid
            .ok_or_else(|| VerifyError::Malformed("missing kid header".into()))?;

        let key = self.decoding_key(&kid).await?;

        let data = decode::<Map<String, Value>>(token, &key, &self.validation())
            .map_err(map_jwt_error)?;

        check_time_claims(&data.claims, unix_now())?;

        let principal = Principal::from_claims(data.claims)?;
        if principal.uid.chars().count() > MAX_UID_LENGTH {
            return Err(VerifyError::Claims(format!(
                "sub longer than {} characters",
                MAX_UID_LENGTH
            )));
        }

        Ok(principal)
    }
}

fn map_jwt_error(err: jsonwebtoken::errors::Error) -> VerifyError {
    match err.kind() {
        ErrorKind::ExpiredSignature => VerifyError::Expired,
        ErrorKind::InvalidSignature => VerifyError::Signature,
        ErrorKind::InvalidAudience => VerifyError::Claims("aud mismatch".into()),
        ErrorKind::InvalidIssuer => VerifyError::Claims("iss mismatch".into()),
        ErrorKind::ImmatureSignature => VerifyError::Claims("token not yet valid".into()),
        ErrorKind::MissingRequiredClaim(claim) => {
            VerifyError::Claims(format!("missing claim {}", claim))
        }
        other => {
            warn!(kind = ?other, "Unclassified token decode failure");
            VerifyError::Malformed(err.to_string())
        }
    }
}

/// `iat` and `auth_time` must not lie in the future.
fn check_time_claims(claims: &Map<String, Value>, now: u64) -> Result<(), VerifyError> {
    for name in ["iat", "auth_time"] {
        match claims.get(name) {
            Some(value) => {
                let ts = value
                    .as_u64()
                    .ok_or_else(|| VerifyError::Claims(format!("{} is not a timestamp", name)))?;
                if ts > now + CLOCK_LEEWAY_SECS {
                    return Err(VerifyError::Claims(format!("{} is in the future", name)));
                }
            }
            None if name == "iat" => {
                return Err(VerifyError::Claims("missing claim iat".into()));
            }
            None => {}
        }
    }
    Ok(())
}

/// Extract `max-age` seconds from a `Cache-Control` header value.
pub fn parse_max_age(cache_control: &str) -> Option<Duration> {
    cache_control
        .split(',')
        .map(str::trim)
        .find_map(|directive| directive.strip_prefix("max-age="))
        .and_then(|secs| secs.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn far_future() -> Instant {
    // Roughly 30 years; `Instant` has no MAX.
    Instant::now() + Duration::from_secs(30 * 365 * 24 * 3600)
}
