//! Postgres-backed resource store.
//!
//! Connections come from a single bounded `PgPool` created at startup and
//! shared by every request. Each operation acquires a connection for one
//! statement and returns it on every exit path; the statement and the pool
//! acquire together are bounded by the store timeout.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{debug, info};

use crate::error::StoreError;

use super::{Assignment, Bin, NewAssignment, NewBin, ResourceStore};

const BIN_COLUMNS: &str = "id, name, location, status, date";

/// Create the process-wide connection pool.
pub async fn create_pool(
    database_url: &str,
    max_connections: u32,
    acquire_timeout: Duration,
) -> Result<PgPool, StoreError> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(acquire_timeout)
        .connect(database_url)
        .await
        .map_err(StoreError::from)
}

/// Apply the bundled schema migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;
    info!("Database migrations applied");
    Ok(())
}

/// [`ResourceStore`] over a Postgres connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    op_timeout: Duration,
}

impl PgStore {
    /// Wrap an existing pool.
    pub fn new(pool: PgPool, op_timeout: Duration) -> Self {
        Self { pool, op_timeout }
    }

    async fn timed<T, F>(&self, op: &'static str, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        debug!(op, "Store operation");
        with_timeout(self.op_timeout, fut).await
    }
}

/// Run a store future, failing with [`StoreError::Timeout`] once `limit` passes.
async fn with_timeout<T, F>(limit: Duration, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result.map_err(StoreError::from),
        Err(_) => Err(StoreError::Timeout(limit)),
    }
}

#[async_trait]
impl ResourceStore for PgStore {
    async fn insert_bin(&self, bin: NewBin) -> Result<Bin, StoreError> {
        let sql = format!(
            "INSERT INTO bins (name, location, status, date) VALUES ($1, $2, $3, $4) RETURNING {}",
            BIN_COLUMNS
        );
        self.timed(
            "insert_bin",
            sqlx::query_as::<_, Bin>(&sql)
                .bind(bin.name)
                .bind(bin.location)
                .bind(bin.status)
                .bind(bin.date)
                .fetch_one(&self.pool),
        )
        .await
    }

    async fn list_bins(&self) -> Result<Vec<Bin>, StoreError> {
        let sql = format!("SELECT {} FROM bins ORDER BY id", BIN_COLUMNS);
        self.timed(
            "list_bins",
            sqlx::query_as::<_, Bin>(&sql).fetch_all(&self.pool),
        )
        .await
    }

    async fn insert_assignment(
        &self,
        assignment: NewAssignment,
    ) -> Result<Assignment, StoreError> {
        self.timed(
            "insert_assignment",
            sqlx::query_as::<_, Assignment>(
                "INSERT INTO assignments (user_id, bin_id) VALUES ($1, $2) \
                 RETURNING id, user_id, bin_id",
            )
            .bind(assignment.user_id)
            .bind(assignment.bin_id)
            .fetch_one(&self.pool),
        )
        .await
    }

    async fn bins_for_user(&self, user_id: &str) -> Result<Vec<Bin>, StoreError> {
        self.timed(
            "bins_for_user",
            sqlx::query_as::<_, Bin>(
                "SELECT bins.id, bins.name, bins.location, bins.status, bins.date \
                 FROM bins \
                 INNER JOIN assignments ON bins.id = assignments.bin_id \
                 WHERE assignments.user_id = $1 \
                 ORDER BY assignments.id",
            )
            .bind(user_id)
            .fetch_all(&self.pool),
        )
        .await
    }
}
