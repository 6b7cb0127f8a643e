//! POST /api/v1/analyze: request an assessment of an existing scrape.

use axum::{extract::rejection::JsonRejection, extract::State, Extension, Json};
use reelscout_core::ScrapeResult;
use serde::Deserialize;
use serde_json::Value;

use crate::middleware::RequestId;

use super::{json_body, map_analyzer_error, require_analyzer, ApiError, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct AnalyzeRequest {
    pub data: Option<ScrapeResult>,
}

pub(super) async fn analyze_profile(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let data = json_body(&req_id.0, body)?.data.ok_or_else(|| {
        ApiError::new(
            &req_id.0,
            "validation_error",
            "invalid or missing Instagram data",
        )
    })?;
    let analyzer = require_analyzer(&state, &req_id.0)?;
    // Client-supplied data gets the same caps as a fresh scrape.
    let data = ScrapeResult::new(data.user_info, data.reels);

    let analysis = analyzer
        .analyze(&data)
        .await
        .map_err(|e| map_analyzer_error(req_id.0.clone(), &e))?;

    Ok(Json(analysis))
}
