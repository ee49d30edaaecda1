//! Configuration management for the SmartBin backend.
//!
//! This module provides a configuration system that supports:
//! - Command-line arguments via clap
//! - Environment variables (a `.env` file is loaded first by the binary)
//! - Defaults for every optional setting
//!
//! # Environment Variables
//!
//! - `HOST` - Server bind address (default: 0.0.0.0)
//! - `PORT` - Server port (default: 5000)
//! - `DATABASE_URL` - Postgres connection string (required)
//! - `DB_MAX_CONNECTIONS` - Connection pool size (default: 10)
//! - `DB_TIMEOUT_SECS` - Pool acquire and statement timeout (default: 10)
//! - `RUN_MIGRATIONS` - Apply schema migrations on startup (default: true)
//! - `FIREBASE_PROJECT_ID` - Project ID tokens must be issued for
//! - `GOOGLE_APPLICATION_CREDENTIALS` - Service account JSON; its
//!   `project_id` is used when `FIREBASE_PROJECT_ID` is unset
//! - `VERIFY_TIMEOUT_SECS` - Token verification timeout (default: 5)
//! - `CORS_ORIGINS` - Comma-separated allowed origins (default: any)

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use serde::Deserialize;

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 5000;

/// Default connection pool size.
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

/// Default store timeout in seconds.
pub const DEFAULT_DB_TIMEOUT_SECS: u64 = 10;

/// Default token verification timeout in seconds.
pub const DEFAULT_VERIFY_TIMEOUT_SECS: u64 = 5;

// =============================================================================
// CLI Arguments
// =============================================================================

/// SmartBin Backend - bin inventory and assignment API.
///
/// Serves bins and user assignments from Postgres. Mutating and per-user
/// routes require a Firebase ID token as a bearer token.
#[derive(Parser, Debug, Clone)]
#[command(name = "smartbin-backend")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "PORT")]
    pub port: u16,

    // =========================================================================
    // Database Configuration
    // =========================================================================
    /// Postgres connection string.
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: String,

    /// Maximum number of pooled connections.
    #[arg(long, default_value_t = DEFAULT_DB_MAX_CONNECTIONS, env = "DB_MAX_CONNECTIONS")]
    pub db_max_connections: u32,

    /// Timeout in seconds for acquiring a connection and for each statement.
    #[arg(long, default_value_t = DEFAULT_DB_TIMEOUT_SECS, env = "DB_TIMEOUT_SECS")]
    pub db_timeout_secs: u64,

    /// Apply schema migrations on startup.
    #[arg(long, default_value_t = true, env = "RUN_MIGRATIONS", action = clap::ArgAction::Set)]
    pub run_migrations: bool,

    // =========================================================================
    // Identity Provider Configuration
    // =========================================================================
    /// Firebase project ID that ID tokens must be issued for.
    #[arg(long, env = "FIREBASE_PROJECT_ID")]
    pub firebase_project_id: Option<String>,

    /// Path to a Firebase service account JSON file.
    ///
    /// Only its `project_id` is read, and only when no project ID is given.
    #[arg(long, env = "GOOGLE_APPLICATION_CREDENTIALS")]
    pub service_account: Option<PathBuf>,

    /// Timeout in seconds for verifying one token, key fetch included.
    #[arg(long, default_value_t = DEFAULT_VERIFY_TIMEOUT_SECS, env = "VERIFY_TIMEOUT_SECS")]
    pub verify_timeout_secs: u64,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

/// The part of a service account file we use.
#[derive(Debug, Deserialize)]
struct ServiceAccount {
    project_id: String,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.database_url.trim().is_empty() {
            return Err("Database URL is required. Set --database-url or DATABASE_URL".to_string());
        }

        if self.db_max_connections == 0 {
            return Err("db_max_connections must be greater than 0".to_string());
        }
        if self.db_timeout_secs == 0 {
            return Err("db_timeout_secs must be greater than 0".to_string());
        }
        if self.verify_timeout_secs == 0 {
            return Err("verify_timeout_secs must be greater than 0".to_string());
        }

        if self.firebase_project_id.is_none() && self.service_account.is_none() {
            return Err(
                "No identity provider configured. Set --firebase-project-id or FIREBASE_PROJECT_ID, \
                 or point GOOGLE_APPLICATION_CREDENTIALS at a service account file"
                    .to_string(),
            );
        }

        Ok(())
    }

    /// Resolve the Firebase project ID, reading the service account file if needed.
    pub fn resolve_project_id(&self) -> Result<String, String> {
        if let Some(project_id) = self.firebase_project_id.as_deref() {
            let project_id = project_id.trim();
            if project_id.is_empty() {
                return Err("firebase_project_id must not be empty".to_string());
            }
            return Ok(project_id.to_string());
        }

        match &self.service_account {
            Some(path) => project_id_from_service_account(path),
            None => Err("No Firebase project ID configured".to_string()),
        }
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Store timeout as a duration.
    pub fn db_timeout(&self) -> Duration {
        Duration::from_secs(self.db_timeout_secs)
    }

    /// Verification timeout as a duration.
    pub fn verify_timeout(&self) -> Duration {
        Duration::from_secs(self.verify_timeout_secs)
    }
}

fn project_id_from_service_account(path: &Path) -> Result<String, String> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read service account {}: {}", path.display(), e))?;
    let account: ServiceAccount = serde_json::from_str(&contents)
        .map_err(|e| format!("Invalid service account {}: {}", path.display(), e))?;

    if account.project_id.trim().is_empty() {
        return Err(format!("Service account {} has an empty project_id", path.display()));
    }
    Ok(account.project_id)
}

// =============================================================================
// Tests
// =============================================================================
