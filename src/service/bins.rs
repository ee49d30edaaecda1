use std::sync::Arc;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;

use crate::error::ValidationError;
use crate::store::{Bin, NewBin, ResourceStore};

use super::{required_text, ServiceError};

/// Accepted format for bin dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Body of `POST /bins`.
///
/// Every field is optional at the parsing stage so that a missing field is
/// reported by name instead of as a generic body error.
#[derive(Debug, Default, Deserialize)]
pub struct CreateBinRequest {
    pub name: Option<String>,
    pub location: Option<String>,
    pub status: Option<String>,
    pub date: Option<String>,
}

impl CreateBinRequest {
    /// Check every field and produce an insertable bin.
    pub fn validate(self) -> Result<NewBin, ValidationError> {
        let name = required_text(self.name, "name")?;
        let location = required_text(self.location, "location")?;
        let status = required_text(self.status, "status")?;
        let date = required_text(self.date, "date")?;
        let date = NaiveDate::parse_from_str(&date, DATE_FORMAT)
            .map_err(|_| ValidationError::InvalidDate(date.clone()))?;

        Ok(NewBin {
            name,
            location,
            status,
            date,
        })
    }
}

/// Creates and lists bins.
pub struct BinService<S: ResourceStore> {
    store: Arc<S>,
}

impl<S: ResourceStore> BinService<S> {
    /// Create a service over a shared store.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Validate and insert a bin, returning it with its generated id.
    pub async fn create(&self, request: CreateBinRequest) -> Result<Bin, ServiceError> {
        let new_bin = request.validate()?;
        let bin = self.store.insert_bin(new_bin).await?;
        info!(bin_id = bin.id, name = %bin.name, "Bin created");
        Ok(bin)
    }

    /// Every bin, unfiltered and unpaginated.
    pub async fn list(&self) -> Result<Vec<Bin>, ServiceError> {
        Ok(self.store.list_bins().await?)
    }
}

impl<S: ResourceStore> Clone for BinService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}
