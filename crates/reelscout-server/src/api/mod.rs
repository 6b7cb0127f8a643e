mod analyze;
mod categories;
mod profiles;
mod scrape;

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use reelscout_analyzer::{AnalyzerError, GeminiClient};
use reelscout_scraper::ScraperError;
use serde::Serialize;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{enforce_rate_limit, request_id, RateLimitState, RequestId};
use crate::persist::RetryPolicy;
use crate::scraping::ProfileScraper;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub scraper: Arc<dyn ProfileScraper>,
    /// `None` when no Gemini key is configured.
    pub analyzer: Option<Arc<GeminiClient>>,
    pub persist_retry: RetryPolicy,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

/// Error body: `{ "error": message, "code": code, "request_id": id }`.
///
/// The HTTP status is derived from `code`.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
    pub request_id: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: message.into(),
            code: code.into(),
            request_id: request_id.into(),
        }
    }

    fn status(&self) -> StatusCode {
        match self.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "timeout" => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status(), Json(self)).into_response()
    }
}

pub(super) fn normalize_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(50).clamp(1, 200)
}

/// Unwrap a JSON body, turning axum's rejection into our error shape.
pub(super) fn json_body<T>(
    request_id: &str,
    body: Result<Json<T>, JsonRejection>,
) -> Result<T, ApiError> {
    body.map(|Json(value)| value).map_err(|rejection| {
        ApiError::new(request_id, "bad_request", rejection.body_text())
    })
}

pub(super) fn map_db_error(request_id: String, error: &reelscout_db::DbError) -> ApiError {
    tracing::error!(error = %error, "database query failed");
    ApiError::new(request_id, "internal_error", "database query failed")
}

pub(super) fn map_scrape_error(request_id: String, error: &ScraperError) -> ApiError {
    match error {
        ScraperError::InvalidHandle(e) => ApiError::new(request_id, "validation_error", e.to_string()),
        ScraperError::Timeout { .. } => {
            tracing::warn!(%request_id, error = %error, "scrape timed out");
            ApiError::new(request_id, "timeout", error.to_string())
        }
        _ => {
            tracing::error!(%request_id, error = %error, "scrape failed");
            ApiError::new(request_id, "scrape_failed", error.to_string())
        }
    }
}

pub(super) fn map_analyzer_error(request_id: String, error: &AnalyzerError) -> ApiError {
    tracing::error!(%request_id, error = %error, "analysis failed");
    let message = match error {
        AnalyzerError::Parse { .. } => "invalid response format from analysis service",
        _ => "failed to analyze profile data",
    };
    ApiError::new(request_id, "analysis_failed", message)
}

pub(super) fn require_analyzer(
    state: &AppState,
    request_id: &str,
) -> Result<Arc<GeminiClient>, ApiError> {
    state.analyzer.clone().ok_or_else(|| {
        ApiError::new(
            request_id,
            "analysis_unavailable",
            "analysis service is not configured",
        )
    })
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static("x-request-id")])
}

pub fn build_app(state: AppState, rate_limit: RateLimitState) -> Router {
    let limited = axum::middleware::from_fn_with_state(rate_limit, enforce_rate_limit);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/categories", get(categories::list_categories))
        .route(
            "/api/v1/analyze",
            post(analyze::analyze_profile).layer(limited.clone()),
        )
        .route(
            "/api/v1/scrape",
            post(scrape::scrape_profile).layer(limited.clone()),
        )
        .route(
            "/api/v1/profiles",
            get(profiles::list_profiles).merge(post(profiles::create_profile).layer(limited)),
        )
        .route("/api/v1/profiles/{username}", get(profiles::get_profile))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match reelscout_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
