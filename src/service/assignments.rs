use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use crate::error::ValidationError;
use crate::store::{Assignment, Bin, NewAssignment, ResourceStore};

use super::{required_text, ServiceError};

/// Body of `POST /assign-bin`.
#[derive(Debug, Default, Deserialize)]
pub struct AssignBinRequest {
    pub user_id: Option<String>,
    pub bin_id: Option<i64>,
}

impl AssignBinRequest {
    /// Check both fields and produce an insertable assignment.
    ///
    /// Whether the bin exists is left to the store's foreign key.
    pub fn validate(self) -> Result<NewAssignment, ValidationError> {
        let user_id = required_text(self.user_id, "user_id")?;
        let bin_id = self.bin_id.ok_or(ValidationError::MissingField("bin_id"))?;
        let bin_id = i32::try_from(bin_id)
            .ok()
            .filter(|id| *id > 0)
            .ok_or(ValidationError::InvalidBinId(bin_id))?;

        Ok(NewAssignment { user_id, bin_id })
    }
}

/// Creates assignments and lists the bins assigned to a user.
pub struct AssignmentService<S: ResourceStore> {
    store: Arc<S>,
}

impl<S: ResourceStore> AssignmentService<S> {
    /// Create a service over a shared store.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Validate and insert an assignment of `bin_id` to `user_id`.
    pub async fn assign(&self, request: AssignBinRequest) -> Result<Assignment, ServiceError> {
        let new_assignment = request.validate()?;
        let assignment = self.store.insert_assignment(new_assignment).await?;
        info!(
            assignment_id = assignment.id,
            user_id = %assignment.user_id,
            bin_id = assignment.bin_id,
            "Bin assigned"
        );
        Ok(assignment)
    }

    /// Bins assigned to `user_id`; empty when there are none.
    pub async fn list_bins_for_user(&self, user_id: &str) -> Result<Vec<Bin>, ServiceError> {
        Ok(self.store.bins_for_user(user_id).await?)
    }
}

impl<S: ResourceStore> Clone for AssignmentService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}
