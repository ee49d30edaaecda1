//! In-process resource store.
//!
//! Applies the same rules as the Postgres schema: ids are generated from 1
//! upwards per table and assignments must reference an existing bin. Used
//! by tests and for running the API without a database.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StoreError;

use super::{Assignment, Bin, NewAssignment, NewBin, ResourceStore};

#[derive(Default)]
struct Tables {
    bins: Vec<Bin>,
    assignments: Vec<Assignment>,
    next_bin_id: i32,
    next_assignment_id: i32,
}

/// [`ResourceStore`] held entirely in memory.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of assignment rows.
    pub async fn assignment_count(&self) -> usize {
        self.tables.read().await.assignments.len()
    }
}

/// Next value of an `i32` id sequence.
fn next_id(last: i32, table: &str) -> Result<i32, StoreError> {
    last.checked_add(1)
        .ok_or_else(|| StoreError::Database(format!("id sequence for {} is exhausted", table)))
}

#[async_trait]
impl ResourceStore for MemoryStore {
    async fn insert_bin(&self, bin: NewBin) -> Result<Bin, StoreError> {
        let mut tables = self.tables.write().await;
        let id = next_id(tables.next_bin_id, "bins")?;
        tables.next_bin_id = id;

        let row = Bin {
            id,
            name: bin.name,
            location: bin.location,
            status: bin.status,
            date: bin.date,
        };
        tables.bins.push(row.clone());
        Ok(row)
    }

    async fn list_bins(&self) -> Result<Vec<Bin>, StoreError> {
        Ok(self.tables.read().await.bins.clone())
    }

    async fn insert_assignment(
        &self,
        assignment: NewAssignment,
    ) -> Result<Assignment, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.bins.iter().any(|b| b.id == assignment.bin_id) {
            return Err(StoreError::ForeignKey(format!(
                "bin_id {} is not present in bins",
                assignment.bin_id
            )));
        }
        let id = next_id(tables.next_assignment_id, "assignments")?;
        tables.next_assignment_id = id;

        let row = Assignment {
            id,
            user_id: assignment.user_id,
            bin_id: assignment.bin_id,
        };
        tables.assignments.push(row.clone());
        Ok(row)
    }

    async fn bins_for_user(&self, user_id: &str) -> Result<Vec<Bin>, StoreError> {
        let tables = self.tables.read().await;
        let rows = tables
            .assignments
            .iter()
            .filter(|a| a.user_id == user_id)
            .filter_map(|a| tables.bins.iter().find(|b| b.id == a.bin_id).cloned())
            .collect();
        Ok(rows)
    }
}
