//! POST /api/v1/scrape: run the scraping pipeline for one handle.

use axum::{extract::rejection::JsonRejection, extract::State, Extension, Json};
use reelscout_core::{normalize_handle, ScrapeResult};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{json_body, map_scrape_error, ApiError, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct ScrapeRequest {
    pub username: Option<String>,
}

/// Validates and normalizes the `username` field of a request body.
pub(super) fn requested_handle(request_id: &str, raw: Option<&str>) -> Result<String, ApiError> {
    let raw = raw
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| ApiError::new(request_id, "validation_error", "username is required"))?;
    normalize_handle(raw).map_err(|e| ApiError::new(request_id, "validation_error", e.to_string()))
}

pub(super) async fn scrape_profile(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<ScrapeRequest>, JsonRejection>,
) -> Result<Json<ScrapeResult>, ApiError> {
    let request = json_body(&req_id.0, body)?;
    let handle = requested_handle(&req_id.0, request.username.as_deref())?;

    tracing::info!(request_id = %req_id.0, %handle, "scrape requested");
    let result = state
        .scraper
        .scrape_profile(&handle)
        .await
        .map_err(|e| map_scrape_error(req_id.0.clone(), &e))?;

    Ok(Json(result))
}
