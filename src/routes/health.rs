use crate::routes::types::{HealthCheckResponse, HealthStatus};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use std::sync::Arc;

use super::AppState;

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let start = std::time::Instant::now();

    // The ping is already bounded by the store timeout
    let store = match state.links.ping().await {
        Ok(()) => HealthStatus {
            status: "healthy".to_string(),
            latency_ms: Some(start.elapsed().as_millis() as u64),
        },
        Err(e) => {
            tracing::warn!("Store health check failed: {}", e);
            HealthStatus {
                status: "unhealthy".to_string(),
                latency_ms: None,
            }
        }
    };

    Json(HealthCheckResponse {
        ok: store.status == "healthy",
        version: env!("CARGO_PKG_VERSION"),
        uptime: state.started_at.elapsed().as_secs_f64(),
        store,
        timestamp: chrono::Utc::now(),
    })
}
