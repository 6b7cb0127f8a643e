//! Persisted profile analyses: the scrape → analyze → persist orchestration
//! plus the dashboard's listing and detail reads.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use reelscout_analyzer::primary_category;
use reelscout_core::{normalize_handle, parse_count};
use reelscout_db::ProfileAnalysisRow;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::middleware::RequestId;
use crate::persist::{persist_or_defer, PendingAnalysis};

use super::scrape::requested_handle;
use super::{
    json_body, map_analyzer_error, map_db_error, map_scrape_error, normalize_limit,
    require_analyzer, ApiError, ApiResponse, AppState, ResponseMeta,
};

#[derive(Debug, Deserialize)]
pub(super) struct CreateProfileRequest {
    pub username: Option<String>,
    #[serde(default)]
    pub refresh: bool,
}

#[derive(Debug, Deserialize)]
pub(super) struct ProfilesQuery {
    pub category: Option<String>,
    pub limit: Option<i64>,
}

/// Full record. `scrapped_data` and `reponse` keep the field names existing
/// dashboards read.
#[derive(Debug, Serialize)]
pub(super) struct ProfileAnalysisItem {
    insta_username: String,
    scrapped_data: Value,
    reponse: Value,
    category: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    /// `true` when served from storage without a new scrape.
    cached: bool,
}

#[derive(Debug, Serialize)]
pub(super) struct ProfileSummaryItem {
    insta_username: String,
    category: Option<String>,
    profile_image: Option<String>,
    engagement_score: Option<String>,
    followers: Option<String>,
    follower_count: Option<u64>,
    created_at: DateTime<Utc>,
}

impl ProfileAnalysisItem {
    fn from_row(row: ProfileAnalysisRow) -> Self {
        Self {
            insta_username: row.insta_username,
            scrapped_data: row.scraped_data,
            reponse: row.analysis,
            category: row.category,
            created_at: row.created_at,
            updated_at: row.updated_at,
            cached: true,
        }
    }
}

impl ProfileSummaryItem {
    fn from_row(row: ProfileAnalysisRow) -> Self {
        let followers = text_at(&row.scraped_data, "/userInfo/followers");
        Self {
            follower_count: followers.as_deref().and_then(parse_count),
            followers,
            profile_image: text_at(&row.scraped_data, "/userInfo/profileImage"),
            engagement_score: text_at(&row.analysis, "/ratings/engagement/score"),
            insta_username: row.insta_username,
            category: row.category,
            created_at: row.created_at,
        }
    }
}

fn text_at(value: &Value, pointer: &str) -> Option<String> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// POST /api/v1/profiles: return the stored analysis for a handle, or build
/// a fresh one when none exists or `refresh` is set.
pub(super) async fn create_profile(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<CreateProfileRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<ProfileAnalysisItem>>, ApiError> {
    let request = json_body(&req_id.0, body)?;
    let handle = requested_handle(&req_id.0, request.username.as_deref())?;

    if !request.refresh {
        match reelscout_db::get_profile_analysis(&state.pool, &handle).await {
            Ok(Some(row)) => {
                tracing::info!(request_id = %req_id.0, %handle, "serving stored analysis");
                return Ok(Json(ApiResponse {
                    data: ProfileAnalysisItem::from_row(row),
                    meta: ResponseMeta::new(req_id.0),
                }));
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(%handle, error = %e, "stored analysis lookup failed; computing fresh");
            }
        }
    }

    let analyzer = require_analyzer(&state, &req_id.0)?;

    let scraped = state
        .scraper
        .scrape_profile(&handle)
        .await
        .map_err(|e| map_scrape_error(req_id.0.clone(), &e))?;
    let analysis = analyzer
        .analyze(&scraped)
        .await
        .map_err(|e| map_analyzer_error(req_id.0.clone(), &e))?;
    let category = primary_category(&analysis);

    let scrapped_data = serde_json::to_value(&scraped)
        .map_err(|e| ApiError::new(&req_id.0, "internal_error", e.to_string()))?;
    let now = Utc::now();
    let item = ProfileAnalysisItem {
        insta_username: handle.clone(),
        scrapped_data,
        reponse: analysis.clone(),
        category: category.clone(),
        created_at: now,
        updated_at: now,
        cached: false,
    };

    persist_or_defer(
        &state.pool,
        PendingAnalysis {
            insta_username: handle,
            scraped_data: scraped,
            analysis,
            category,
        },
        state.persist_retry,
    )
    .await;

    Ok(Json(ApiResponse {
        data: item,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /api/v1/profiles: most recent analyses, optionally by category.
pub(super) async fn list_profiles(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ProfilesQuery>,
) -> Result<Json<ApiResponse<Vec<ProfileSummaryItem>>>, ApiError> {
    let category = query
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());

    let rows =
        reelscout_db::list_profile_analyses(&state.pool, category, normalize_limit(query.limit))
            .await
            .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(ProfileSummaryItem::from_row).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /api/v1/profiles/{username}
pub(super) async fn get_profile(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(username): Path<String>,
) -> Result<Json<ApiResponse<ProfileAnalysisItem>>, ApiError> {
    let handle = normalize_handle(&username)
        .map_err(|e| ApiError::new(&req_id.0, "validation_error", e.to_string()))?;

    let row = reelscout_db::get_profile_analysis(&state.pool, &handle)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| ApiError::new(&req_id.0, "not_found", "profile analysis not found"))?;

    Ok(Json(ApiResponse {
        data: ProfileAnalysisItem::from_row(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}
