//! Bin and assignment services.
//!
//! Services sit between the HTTP handlers and the [`ResourceStore`]. They
//! validate request payloads before any store call and otherwise pass
//! through to single store operations; nothing is retried.
//!
//! [`ResourceStore`]: crate::store::ResourceStore

mod assignments;
mod bins;

use thiserror::Error;

use crate::error::{StoreError, ValidationError};

pub use assignments::{AssignBinRequest, AssignmentService};
pub use bins::{BinService, CreateBinRequest, DATE_FORMAT};

/// Failure of a service operation.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Payload rejected before reaching the store
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The store call failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Trimmed value of a required text field.
fn required_text(value: Option<String>, field: &'static str) -> Result<String, ValidationError> {
    let value = value.ok_or(ValidationError::MissingField(field))?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(trimmed.to_string())
}
