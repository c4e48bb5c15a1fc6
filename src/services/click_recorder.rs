use super::bounded;
use super::short_code::ShortCodeService;
use crate::db::LinkRepository;
use crate::error::{AppError, AppResult};
use crate::models::Link;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Records a resolution of a code.
///
/// The counter update is a single store-side increment; nothing here reads a
/// counter and writes it back.
#[derive(Clone)]
pub struct ClickRecorder {
    repository: Arc<dyn LinkRepository>,
    store_timeout: Duration,
}

impl ClickRecorder {
    pub fn new(repository: Arc<dyn LinkRepository>, store_timeout: Duration) -> Self {
        Self {
            repository,
            store_timeout,
        }
    }

    /// Count one click on `code` and return the updated link.
    ///
    /// `NotFound` is the normal answer for a mistyped or deleted code. A
    /// timeout surfaces as `StoreUnavailable` and is not retried, since the
    /// increment may already have been applied.
    pub async fn record_click(&self, code: &str) -> AppResult<Link> {
        // Malformed codes can never be stored.
        if !ShortCodeService::is_well_formed(code) {
            return Err(AppError::NotFound(code.to_string()));
        }

        let link = bounded(
            self.store_timeout,
            "increment_click",
            self.repository.increment_click(code),
        )
        .await?
        .ok_or_else(|| AppError::NotFound(code.to_string()))?;

        debug!(code, total_clicks = link.total_clicks, "Click recorded");
        Ok(link)
    }
}
