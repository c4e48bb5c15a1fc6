use crate::services::LinkService;
use std::time::Instant;

/// Application state shared across all HTTP handlers.
///
/// Wrapped in `Arc` and handed to axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Link operations, backed by the process-wide repository
    pub links: LinkService,

    /// Base URL for constructing short URLs (e.g., "http://localhost:3000")
    pub base_url: String,

    /// Process start, reported as uptime by the health check
    pub started_at: Instant,
}

impl AppState {
    pub fn new(links: LinkService, base_url: impl Into<String>) -> Self {
        Self {
            links,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            started_at: Instant::now(),
        }
    }

    pub fn short_url(&self, code: &str) -> String {
        format!("{}/{}", self.base_url, code)
    }
}
