//! Administrative command handlers.
//!
//! CLI command handlers for running migrations, listing and deleting links,
//! and checking store connectivity.

use crate::config::{Config, StoreBackend};
use crate::db::{self, PgLinkRepository};
use crate::error::AppResult;
use crate::server::allocation_policy;
use crate::services::LinkService;
use clap::Subcommand;
use tracing::{info, warn};

/// Administrative commands available via CLI.
#[derive(Subcommand, Debug)]
pub enum AdminCommands {
    /// Run database migrations
    Migrate,

    /// List all links, newest first
    List,

    /// Delete a link by code
    Delete {
        /// Code of the link to delete
        code: String,
    },

    /// Check connectivity to the store
    Ping,
}

/// Run an administrative command with the given configuration.
pub async fn run(config: Config, admin_command: AdminCommands) -> AppResult<()> {
    match admin_command {
        AdminCommands::Migrate => migrate(config).await,
        AdminCommands::List => list(config).await,
        AdminCommands::Delete { code } => delete(config, &code).await,
        AdminCommands::Ping => ping(config).await,
    }
}

async fn link_service(config: &Config) -> AppResult<LinkService> {
    let repository = db::open_repository(&config.database, false).await?;
    Ok(LinkService::new(
        repository,
        allocation_policy(config),
        config.store_timeout(),
    ))
}

/// Run database migrations.
async fn migrate(config: Config) -> AppResult<()> {
    if config.database.backend == StoreBackend::Memory {
        warn!("The memory backend has no schema, nothing to migrate");
        return Ok(());
    }

    info!("Running database migrations...");

    let repository = PgLinkRepository::new(
        &config.database.url,
        config.database.max_connections,
        config.database.min_connections,
        config.database.acquire_timeout_seconds,
    )
    .await?;

    repository.run_migrations().await?;

    info!("Migrations completed successfully");
    Ok(())
}

/// Print every link.
async fn list(config: Config) -> AppResult<()> {
    let links = link_service(&config).await?.list_all().await?;
    let base_url = config.base_url();

    println!("\n=== tinylink links ({}) ===", links.len());
    for link in links {
        let last_clicked = link
            .last_clicked_at
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{}/{:<8}  clicks: {:<6}  last: {:<25}  -> {}",
            base_url, link.code, link.total_clicks, last_clicked, link.target_url
        );
    }
    println!();

    Ok(())
}

/// Delete a link.
async fn delete(config: Config, code: &str) -> AppResult<()> {
    link_service(&config).await?.delete_by_code(code).await?;
    info!("Deleted link {}", code);
    Ok(())
}

/// Ping the store.
async fn ping(config: Config) -> AppResult<()> {
    info!("Pinging store...");
    link_service(&config).await?.ping().await?;
    info!("Store is reachable");
    Ok(())
}
