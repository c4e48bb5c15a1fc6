use super::allocator::{AllocationPolicy, LinkAllocator};
use super::bounded;
use super::click_recorder::ClickRecorder;
use super::short_code::ShortCodeService;
use crate::db::LinkRepository;
use crate::error::{AppError, AppResult};
use crate::models::Link;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Entry point for the application layer.
///
/// Holds the injected repository and applies the per-call store timeout to
/// every operation.
#[derive(Clone)]
pub struct LinkService {
    repository: Arc<dyn LinkRepository>,
    allocator: LinkAllocator,
    click_recorder: ClickRecorder,
    store_timeout: Duration,
}

impl LinkService {
    pub fn new(
        repository: Arc<dyn LinkRepository>,
        policy: AllocationPolicy,
        store_timeout: Duration,
    ) -> Self {
        Self {
            allocator: LinkAllocator::new(repository.clone(), policy, store_timeout),
            click_recorder: ClickRecorder::new(repository.clone(), store_timeout),
            repository,
            store_timeout,
        }
    }

    pub async fn allocate(&self, target_url: &str, custom_code: Option<&str>) -> AppResult<Link> {
        self.allocator.allocate(target_url, custom_code).await
    }

    pub async fn find_by_code(&self, code: &str) -> AppResult<Link> {
        if !ShortCodeService::is_well_formed(code) {
            return Err(AppError::NotFound(code.to_string()));
        }

        bounded(
            self.store_timeout,
            "find_by_code",
            self.repository.find_by_code(code),
        )
        .await?
        .ok_or_else(|| AppError::NotFound(code.to_string()))
    }

    /// All links, newest first
    pub async fn list_all(&self) -> AppResult<Vec<Link>> {
        bounded(self.store_timeout, "list_all", self.repository.list_all()).await
    }

    /// Delete a link. The code becomes free for later allocations.
    pub async fn delete_by_code(&self, code: &str) -> AppResult<()> {
        if !ShortCodeService::is_well_formed(code) {
            return Err(AppError::NotFound(code.to_string()));
        }

        let deleted = bounded(
            self.store_timeout,
            "delete_by_code",
            self.repository.delete_by_code(code),
        )
        .await?;

        if !deleted {
            return Err(AppError::NotFound(code.to_string()));
        }

        info!(code, "Link deleted");
        Ok(())
    }

    pub async fn record_click(&self, code: &str) -> AppResult<Link> {
        self.click_recorder.record_click(code).await
    }

    pub async fn ping(&self) -> AppResult<()> {
        bounded(self.store_timeout, "ping", self.repository.ping()).await
    }
}
