//! Resource store: bins and their assignments to users.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │      BinService / AssignmentService     │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │          ResourceStore Trait            │
//! └────────────────────┬────────────────────┘
//!                      │
//!          ┌───────────┴───────────┐
//!          ▼                       ▼
//! ┌─────────────────┐    ┌─────────────────────┐
//! │     PgStore     │    │    MemoryStore      │
//! │ (sqlx Postgres) │    │  (in-process)       │
//! └─────────────────┘    └─────────────────────┘
//! ```
//!
//! Users are not stored. A user is the opaque `uid` string of a verified
//! principal and only appears as `assignments.user_id`.
//!
//! Every operation is a single statement. There are no multi-statement
//! transactions; referential integrity between assignments and bins is
//! enforced by the schema's foreign key.

mod memory;
mod models;
mod postgres;

use async_trait::async_trait;

use crate::error::StoreError;

pub use memory::MemoryStore;
pub use models::{Assignment, Bin, NewAssignment, NewBin};
pub use postgres::{create_pool, run_migrations, PgStore};

/// Persistence operations for bins and assignments.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Insert a bin and return it with its generated id.
    async fn insert_bin(&self, bin: NewBin) -> Result<Bin, StoreError>;

    /// Every bin, ordered by id.
    async fn list_bins(&self) -> Result<Vec<Bin>, StoreError>;

    /// Insert an assignment and return it with its generated id.
    ///
    /// Fails with [`StoreError::ForeignKey`] when `bin_id` names no bin.
    async fn insert_assignment(
        &self,
        assignment: NewAssignment,
    ) -> Result<Assignment, StoreError>;

    /// Bins joined through assignments for `user_id`, in assignment order.
    ///
    /// One row is returned per assignment, so a bin assigned twice to the same
    /// user appears twice.
    async fn bins_for_user(&self, user_id: &str) -> Result<Vec<Bin>, StoreError>;
}
