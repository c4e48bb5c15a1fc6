//! Link storage.
//!
//! [`LinkRepository`] is the only owner of persisted link state. Every
//! operation is a single statement against the backing store, so the store's
//! per-row atomicity is what keeps codes unique and click counters exact.

mod memory;
mod postgres;

pub use memory::MemoryLinkRepository;
pub use postgres::PgLinkRepository;

use crate::config::{DatabaseConfig, StoreBackend};
use crate::error::AppResult;
use crate::models::Link;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};

/// Result of a conditional insert.
#[derive(Debug)]
pub enum InsertOutcome {
    Inserted(Link),
    AlreadyExists,
}

/// Storage operations consumed by the allocator and the click recorder.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Check if a code is currently stored
    async fn exists(&self, code: &str) -> AppResult<bool>;

    /// Insert a new link unless the code is already taken.
    ///
    /// Uniqueness is enforced by the store in the same statement, so two
    /// concurrent callers with the same code can never both get `Inserted`.
    /// `created_at` is stored as given; callers pick it so they can recognise
    /// their own row later.
    async fn insert_if_absent(
        &self,
        code: &str,
        target_url: &str,
        created_at: DateTime<Utc>,
    ) -> AppResult<InsertOutcome>;

    async fn find_by_code(&self, code: &str) -> AppResult<Option<Link>>;

    /// Returns `false` when there was nothing to delete.
    async fn delete_by_code(&self, code: &str) -> AppResult<bool>;

    /// All links, newest `created_at` first
    async fn list_all(&self) -> AppResult<Vec<Link>>;

    /// Add one click and stamp `last_clicked_at`, returning the updated row.
    async fn increment_click(&self, code: &str) -> AppResult<Option<Link>>;

    /// Connectivity probe
    async fn ping(&self) -> AppResult<()>;
}

/// Build the repository selected by configuration.
///
/// The returned handle owns the process-wide connection pool and is meant to
/// be created once at startup and shared.
pub async fn open_repository(
    config: &DatabaseConfig,
    run_migrations: bool,
) -> AppResult<Arc<dyn LinkRepository>> {
    match config.backend {
        StoreBackend::Postgres => {
            info!("Connecting to database...");
            let repository = PgLinkRepository::new(
                &config.url,
                config.max_connections,
                config.min_connections,
                config.acquire_timeout_seconds,
            )
            .await?;

            if run_migrations {
                info!("Running database migrations...");
                repository.run_migrations().await?;
                info!("Migrations completed successfully");
            }

            Ok(Arc::new(repository))
        }
        StoreBackend::Memory => {
            warn!("Using the in-memory store, links will not survive a restart");
            Ok(Arc::new(MemoryLinkRepository::new()))
        }
    }
}
