use crate::config::CorsConfig;
use crate::middleware::request_id_middleware;
use axum::middleware;
use axum::routing::get;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use super::health;
use super::link_handlers;
use super::AppState;

/// Create request bodies are a URL and a code; anything near this is abuse.
const MAX_BODY_BYTES: usize = 16 * 1024;

/// Create application router
pub fn create_router(state: Arc<AppState>, cors_config: &CorsConfig) -> axum::Router {
    let cors = if cors_config.allows_any() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<http::HeaderValue> = cors_config
            .allowed_origins
            .iter()
            .filter_map(|s| s.parse::<http::HeaderValue>().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let api_routes = axum::Router::new()
        .route("/api/healthz", get(health::health_check))
        .route(
            "/api/links",
            get(link_handlers::list_links).post(link_handlers::create_link),
        )
        .route(
            "/api/links/{code}",
            get(link_handlers::get_link).delete(link_handlers::delete_link),
        )
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(cors);

    // Everything else at the root is a short code, so nothing else lives here.
    let public_routes = axum::Router::new().route("/{code}", get(link_handlers::resolve_link));

    api_routes
        .merge(public_routes)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}
