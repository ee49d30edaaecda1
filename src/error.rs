use thiserror::Error;

/// Errors raised by the relational store.
///
/// The `Display` text carries store detail for logs. It is never written to a
/// response body.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Error reported by the database driver
    #[error("Database error: {0}")]
    Database(String),

    /// Insert referenced a row that does not exist
    #[error("Foreign key violation: {0}")]
    ForeignKey(String),

    /// The statement or connection acquisition did not finish in time
    #[error("Store operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// No connection could be obtained from the pool
    #[error("Connection pool error: {0}")]
    Pool(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                StoreError::ForeignKey(db_err.message().to_string())
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                StoreError::Pool(err.to_string())
            }
            other => StoreError::Database(other.to_string()),
        }
    }
}

/// Request payload rejected before any store call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field was absent (or JSON null)
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// A required text field was empty or whitespace only
    #[error("Field must not be empty: {0}")]
    EmptyField(&'static str),

    /// The bin date is not a calendar date in `YYYY-MM-DD` form
    #[error("Invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    /// The bin id is not a positive integer
    #[error("Invalid bin_id {0}: must be a positive integer")]
    InvalidBinId(i64),
}

/// Reasons an identity token failed verification.
///
/// Callers outside the identity module only ever see these collapsed into a
/// single rejection; the variants exist for logging.
#[derive(Debug, Clone, Error)]
pub enum VerifyError {
    /// Token is not a decodable JWT or the header is unusable
    #[error("Malformed token: {0}")]
    Malformed(String),

    /// The `kid` in the header is not in the provider's key set
    #[error("Unknown signing key: {0}")]
    UnknownKey(String),

    /// Signature did not verify against the provider key
    #[error("Invalid signature")]
    Signature,

    /// Token `exp` is in the past
    #[error("Token expired")]
    Expired,

    /// A registered claim failed validation (aud, iss, sub, iat)
    #[error("Invalid claim: {0}")]
    Claims(String),

    /// The provider's public keys could not be fetched
    #[error("Failed to fetch signing keys: {0}")]
    KeyFetch(String),

    /// Verification did not complete within the configured timeout
    #[error("Verification timed out")]
    Timeout,
}
