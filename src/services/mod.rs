pub mod allocator;
pub mod click_recorder;
pub mod links;
pub mod short_code;

pub use allocator::{AllocationPolicy, LinkAllocator};
pub use click_recorder::ClickRecorder;
pub use links::LinkService;
pub use short_code::ShortCodeService;

use crate::error::{AppError, AppResult};
use std::future::Future;
use std::time::Duration;

/// Run one repository call under `limit`.
///
/// A timeout is reported as `StoreUnavailable`. The call may still have taken
/// effect in the store, so callers must not assume it did not.
pub(crate) async fn bounded<T, F>(limit: Duration, operation: &'static str, call: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    tokio::time::timeout(limit, call).await.map_err(|_| {
        AppError::StoreUnavailable(format!(
            "{} timed out after {}ms",
            operation,
            limit.as_millis()
        ))
    })?
}
