//! SmartBin Backend - bin inventory and assignment API.
//!
//! This binary starts the HTTP server and configures all components.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use smartbin_backend::{
    config::Config,
    identity::FirebaseVerifier,
    server::{create_router, RouterConfig},
    store::{create_pool, run_migrations, PgStore},
};

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is normal in production.
    let dotenv = dotenvy::dotenv();

    let config = Config::parse();
    init_logging(config.verbose);

    if let Ok(path) = dotenv {
        info!("Loaded environment from {}", path.display());
    }

    run_serve(config).await
}

// =============================================================================
// Serve Command
// =============================================================================

async fn run_serve(config: Config) -> ExitCode {
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let project_id = match config.resolve_project_id() {
        Ok(project_id) => project_id,
        Err(e) => {
            error!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("SmartBin Backend v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  Firebase project: {}", project_id);
    info!(
        "  Database pool: {} connections, {}s timeout",
        config.db_max_connections, config.db_timeout_secs
    );
    info!("  Token verification timeout: {}s", config.verify_timeout_secs);
    match &config.cors_origins {
        Some(origins) => info!("  CORS origins: {}", origins.join(", ")),
        None => warn!("  CORS: any origin allowed"),
    }

    // Connect to the store
    let pool = match create_pool(
        &config.database_url,
        config.db_max_connections,
        config.db_timeout(),
    )
    .await
    {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            return ExitCode::FAILURE;
        }
    };
    info!("Connected to database");

    if config.run_migrations {
        if let Err(e) = run_migrations(&pool).await {
            error!("Failed to apply migrations: {}", e);
            return ExitCode::FAILURE;
        }
    }

    let store = Arc::new(PgStore::new(pool, config.db_timeout()));

    let verifier = match FirebaseVerifier::new(project_id, config.verify_timeout()) {
        Ok(verifier) => Arc::new(verifier),
        Err(e) => {
            error!("Failed to create token verifier: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let router = create_router(store, verifier, build_router_config(&config));

    let addr = config.bind_address();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    info!("Server running on http://{}", addr);

    if let Err(e) = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Server stopped");
    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "smartbin_backend=debug,tower_http=debug"
    } else {
        "smartbin_backend=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application Config.
fn build_router_config(config: &Config) -> RouterConfig {
    let mut router_config = RouterConfig::new()
        .with_tracing(!config.no_tracing)
        .with_verify_timeout(config.verify_timeout());

    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    router_config
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
}

// =============================================================================
// Tests
// =============================================================================
