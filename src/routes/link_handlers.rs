use crate::error::{AppError, AppResult};
use crate::models::CreateLinkRequest;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Redirect};
use std::sync::Arc;
use url::Url;

use super::AppState;

/// Create a link, with a custom or a generated code
pub async fn create_link(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateLinkRequest>,
) -> AppResult<impl IntoResponse> {
    let target_url = payload.target_url.as_deref().unwrap_or_default();
    let link = state.links.allocate(target_url, payload.custom_code()).await?;

    let location = state.short_url(&link.code);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(link)))
}

/// List all links, newest first
pub async fn list_links(State(state): State<Arc<AppState>>) -> AppResult<impl IntoResponse> {
    let links = state.links.list_all().await?;
    Ok(Json(links))
}

/// Get a single link with its counters
pub async fn get_link(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> AppResult<impl IntoResponse> {
    let link = state.links.find_by_code(&code).await?;
    Ok(Json(link))
}

/// Delete a link
pub async fn delete_link(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.links.delete_by_code(&code).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Record a click and redirect to the target.
///
/// Temporary redirect, so browsers come back through here and every visit is counted.
pub async fn resolve_link(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> AppResult<impl IntoResponse> {
    let link = state.links.record_click(&code).await?;

    // The serialized form is always a valid Location header, the raw input may not be
    let target = Url::parse(&link.target_url).map_err(|e| {
        AppError::Internal(format!("Stored target for {} does not parse: {}", link.code, e))
    })?;
    Ok(Redirect::temporary(target.as_str()))
}
