//! Server startup and shutdown.
//!
//! `run_server` opens the repository (and with it the process-wide connection
//! pool), wires the services into the application state, builds the router
//! and serves until a shutdown signal arrives.

use crate::config::Config;
use crate::db;
use crate::error::{AppError, AppResult};
use crate::routes;
use crate::services::{AllocationPolicy, LinkService};
use crate::state::AppState;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Allocation policy from configuration
pub fn allocation_policy(config: &Config) -> AllocationPolicy {
    AllocationPolicy {
        code_length: config.links.short_code_length,
        max_attempts: config.links.short_code_max_attempts,
        strict_url_validation: config.links.strict_url_validation,
    }
}

/// Run the web server with the given configuration.
///
/// # Arguments
///
/// * `config` - The application configuration
/// * `should_migrate` - Whether to run database migrations on startup
///
/// # Errors
///
/// This function will return an error if:
/// - Database connection or migration fails
/// - Server binding fails
/// - Server runtime error occurs
pub async fn run_server(config: Config, should_migrate: bool) -> AppResult<()> {
    info!("Starting tinylink server...");

    let repository = db::open_repository(&config.database, should_migrate).await?;

    let links = LinkService::new(repository, allocation_policy(&config), config.store_timeout());
    let state = Arc::new(AppState::new(links, config.base_url()));

    let app = routes::create_router(state, &config.cors);

    let addr = config.server.address();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to bind to address {}: {}", addr, e)))?;

    info!("Server listening on {}", addr);
    info!("Base URL: {}", config.base_url());

    axum::serve(listener, app)
        .with_graceful_shutdown(create_shutdown_signal())
        .await
        .map_err(|e| AppError::Internal(format!("Server error: {}", e)))?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on Unix.
///
/// If a signal handler cannot be installed that branch never resolves, and
/// the remaining one still drives shutdown.
async fn create_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    #[cfg(not(unix))]
    ctrl_c.await;

    info!("Shutdown signal received");
}
