use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::Request;
use futures::future::BoxFuture;
use reelscout_core::{CoreError, ProfileRecord, ScrapeResult};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;

// -------------------------------------------------------------------------
// Fixtures
// -------------------------------------------------------------------------

#[derive(Clone, Copy)]
enum Behaviour {
    Succeed,
    TimeOut,
    FailNavigation,
}

struct FakeScraper {
    behaviour: Behaviour,
    calls: AtomicUsize,
}

impl FakeScraper {
    fn new(behaviour: Behaviour) -> Arc<Self> {
        Arc::new(Self {
            behaviour,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ProfileScraper for FakeScraper {
    fn scrape_profile<'a>(
        &'a self,
        handle: &'a str,
    ) -> BoxFuture<'a, Result<ScrapeResult, ScraperError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let result = match self.behaviour {
            Behaviour::Succeed => Ok(sample_scrape(handle)),
            Behaviour::TimeOut => Err(ScraperError::Timeout { secs: 300 }),
            Behaviour::FailNavigation => Err(ScraperError::Navigation {
                url: format!("https://www.instagram.com/{handle}/"),
                reason: "net::ERR_CONNECTION_RESET".to_string(),
            }),
        };
        Box::pin(async move { result })
    }
}

fn sample_scrape(handle: &str) -> ScrapeResult {
    ScrapeResult::new(
        ProfileRecord {
            username: handle.to_string(),
            name: "Mira Okafor".to_string(),
            bio_text: "Slow travel".to_string(),
            profile_image: "https://cdn.example/avatar.jpg".to_string(),
            followers: Some("48.3K followers".to_string()),
            following: None,
            posts: None,
            links: Vec::new(),
        },
        Vec::new(),
    )
}

const ANALYSIS_REPLY: &str = "```json\n{\"categoryClassification\": {\"primary\": {\"name\": \"Travel\", \"percentage\": \"70%\"}}, \"ratings\": {\"engagement\": {\"score\": \"8/10\"}}}\n```";

async fn gemini(reply_text: &str) -> (MockServer, Arc<GeminiClient>) {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-test:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": reply_text }] } }]
        })))
        .mount(&server)
        .await;
    let client = GeminiClient::with_base_url(
        "test-key",
        "gemini-test",
        10,
        &format!("{}/v1beta", server.uri()),
    )
    .expect("client");
    (server, Arc::new(client))
}

/// A pool that never connects; for routes that must not touch the database.
fn lazy_pool() -> PgPool {
    sqlx::postgres::PgPoolOptions::new()
        .acquire_timeout(Duration::from_millis(200))
        .connect_lazy("postgres://reelscout@127.0.0.1:1/unused")
        .expect("lazy pool")
}

fn state(
    pool: PgPool,
    scraper: Arc<FakeScraper>,
    analyzer: Option<Arc<GeminiClient>>,
) -> AppState {
    AppState {
        pool,
        scraper,
        analyzer,
        persist_retry: RetryPolicy {
            max_retries: 1,
            base_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(10),
        },
    }
}

fn app(state: AppState) -> Router {
    build_app(state, RateLimitState::new(100, Duration::from_secs(60)))
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

async fn read_json(response: axum::response::Response) -> Value {
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    serde_json::from_slice(&body).expect("json parse")
}

// -------------------------------------------------------------------------
// Error envelope
// -------------------------------------------------------------------------

#[test]
fn api_error_codes_map_to_statuses() {
    let cases = [
        ("validation_error", StatusCode::BAD_REQUEST),
        ("bad_request", StatusCode::BAD_REQUEST),
        ("not_found", StatusCode::NOT_FOUND),
        ("rate_limited", StatusCode::TOO_MANY_REQUESTS),
        ("timeout", StatusCode::GATEWAY_TIMEOUT),
        ("scrape_failed", StatusCode::INTERNAL_SERVER_ERROR),
        ("analysis_unavailable", StatusCode::INTERNAL_SERVER_ERROR),
    ];
    for (code, status) in cases {
        let response = ApiError::new("req-1", code, "message").into_response();
        assert_eq!(response.status(), status, "code {code}");
    }
}

#[test]
fn normalize_limit_applies_defaults_and_bounds() {
    assert_eq!(normalize_limit(None), 50);
    assert_eq!(normalize_limit(Some(0)), 1);
    assert_eq!(normalize_limit(Some(1_000)), 200);
    assert_eq!(normalize_limit(Some(25)), 25);
}

#[test]
fn invalid_handle_scrape_error_is_validation_error() {
    let error = ScraperError::InvalidHandle(CoreError::InvalidHandle {
        handle: "a b".to_string(),
        reason: "bad".to_string(),
    });
    let mapped = map_scrape_error("req-1".to_string(), &error);
    assert_eq!(mapped.code, "validation_error");
}

// -------------------------------------------------------------------------
// POST /api/v1/scrape
// -------------------------------------------------------------------------

#[tokio::test]
async fn scrape_requires_username() {
    let scraper = FakeScraper::new(Behaviour::Succeed);
    let response = app(state(lazy_pool(), scraper.clone(), None))
        .oneshot(post_json("/api/v1/scrape", &json!({})))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = read_json(response).await;
    assert_eq!(json["code"], "validation_error");
    assert_eq!(json["error"], "username is required");
    assert!(json["request_id"].as_str().is_some_and(|id| !id.is_empty()));
    assert_eq!(scraper.calls(), 0);
}

#[tokio::test]
async fn scrape_rejects_invalid_handle_without_scraping() {
    let scraper = FakeScraper::new(Behaviour::Succeed);
    let response = app(state(lazy_pool(), scraper.clone(), None))
        .oneshot(post_json("/api/v1/scrape", &json!({ "username": "not a handle!" })))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(scraper.calls(), 0);
}

#[tokio::test]
async fn malformed_body_is_bad_request() {
    let scraper = FakeScraper::new(Behaviour::Succeed);
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/scrape")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .expect("request");
    let response = app(state(lazy_pool(), scraper, None))
        .oneshot(request)
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(response).await["code"], "bad_request");
}

#[tokio::test]
async fn scrape_returns_result_and_echoes_request_id() {
    let scraper = FakeScraper::new(Behaviour::Succeed);
    let mut request = post_json("/api/v1/scrape", &json!({ "username": "@WanderWithMira" }));
    request
        .headers_mut()
        .insert("x-request-id", "req-42".parse().expect("header"));

    let response = app(state(lazy_pool(), scraper.clone(), None))
        .oneshot(request)
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-request-id").and_then(|v| v.to_str().ok()),
        Some("req-42")
    );
    let json = read_json(response).await;
    assert_eq!(json["userInfo"]["username"], "wanderwithmira");
    assert_eq!(json["reels"], json!([]));
    assert_eq!(scraper.calls(), 1);
}

#[tokio::test]
async fn scrape_budget_exceeded_is_gateway_timeout() {
    let scraper = FakeScraper::new(Behaviour::TimeOut);
    let response = app(state(lazy_pool(), scraper, None))
        .oneshot(post_json("/api/v1/scrape", &json!({ "username": "wanderwithmira" })))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(read_json(response).await["code"], "timeout");
}

#[tokio::test]
async fn scrape_navigation_failure_is_internal_error() {
    let scraper = FakeScraper::new(Behaviour::FailNavigation);
    let response = app(state(lazy_pool(), scraper, None))
        .oneshot(post_json("/api/v1/scrape", &json!({ "username": "wanderwithmira" })))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(read_json(response).await["code"], "scrape_failed");
}

#[tokio::test]
async fn scrape_routes_are_rate_limited() {
    let scraper = FakeScraper::new(Behaviour::Succeed);
    let app = build_app(
        state(lazy_pool(), scraper.clone(), None),
        RateLimitState::new(1, Duration::from_secs(60)),
    );
    let body = json!({ "username": "wanderwithmira" });

    let first = app
        .clone()
        .oneshot(post_json("/api/v1/scrape", &body))
        .await
        .expect("response");
    let second = app
        .oneshot(post_json("/api/v1/scrape", &body))
        .await
        .expect("response");

    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(read_json(second).await["code"], "rate_limited");
    assert_eq!(scraper.calls(), 1);
}

// -------------------------------------------------------------------------
// POST /api/v1/analyze
// -------------------------------------------------------------------------

#[tokio::test]
async fn analyze_requires_data() {
    let (_server, analyzer) = gemini(ANALYSIS_REPLY).await;
    let response = app(state(
        lazy_pool(),
        FakeScraper::new(Behaviour::Succeed),
        Some(analyzer),
    ))
    .oneshot(post_json("/api/v1/analyze", &json!({})))
    .await
    .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        read_json(response).await["error"],
        "invalid or missing Instagram data"
    );
}

#[tokio::test]
async fn analyze_without_configured_service_fails() {
    let body = json!({ "data": sample_scrape("wanderwithmira") });
    let response = app(state(lazy_pool(), FakeScraper::new(Behaviour::Succeed), None))
        .oneshot(post_json("/api/v1/analyze", &body))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(read_json(response).await["code"], "analysis_unavailable");
}

#[tokio::test]
async fn analyze_returns_parsed_reply() {
    let (_server, analyzer) = gemini(ANALYSIS_REPLY).await;
    let body = json!({ "data": sample_scrape("wanderwithmira") });
    let response = app(state(
        lazy_pool(),
        FakeScraper::new(Behaviour::Succeed),
        Some(analyzer),
    ))
    .oneshot(post_json("/api/v1/analyze", &body))
    .await
    .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let json = read_json(response).await;
    assert_eq!(json["ratings"]["engagement"]["score"], "8/10");
}

#[tokio::test]
async fn analyze_unparseable_reply_is_internal_error() {
    let (_server, analyzer) = gemini("I would rather not.").await;
    let body = json!({ "data": sample_scrape("wanderwithmira") });
    let response = app(state(
        lazy_pool(),
        FakeScraper::new(Behaviour::Succeed),
        Some(analyzer),
    ))
    .oneshot(post_json("/api/v1/analyze", &body))
    .await
    .expect("response");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = read_json(response).await;
    assert_eq!(json["code"], "analysis_failed");
    assert_eq!(json["error"], "invalid response format from analysis service");
}

#[tokio::test]
async fn analyze_caps_client_supplied_posts_and_comments() {
    let (server, analyzer) = gemini(ANALYSIS_REPLY).await;
    let comments: Vec<Value> = (0..12)
        .map(|i| json!({ "username": "fan", "text": format!("note-{i:02}"), "likes": "0" }))
        .collect();
    let reels: Vec<Value> = (0..7)
        .map(|i| {
            json!({
                "url": format!("https://www.instagram.com/reel/r{i}/"),
                "thumbnail": null,
                "videoUrl": null,
                "caption": "",
                "likeCount": "0",
                "postDate": "",
                "comments": comments,
            })
        })
        .collect();
    let mut data = serde_json::to_value(sample_scrape("wanderwithmira")).expect("serialize");
    data["reels"] = Value::Array(reels);

    let response = app(state(
        lazy_pool(),
        FakeScraper::new(Behaviour::Succeed),
        Some(analyzer),
    ))
    .oneshot(post_json("/api/v1/analyze", &json!({ "data": data })))
    .await
    .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let requests = server.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 1);
    let sent = String::from_utf8_lossy(&requests[0].body);
    assert!(sent.contains("reel/r4/"));
    assert!(!sent.contains("reel/r5/"));
    assert!(sent.contains("note-09"));
    assert!(!sent.contains("note-10"));
}

#[tokio::test]
async fn analyze_is_rate_limited() {
    let (server, analyzer) = gemini(ANALYSIS_REPLY).await;
    let app = build_app(
        state(lazy_pool(), FakeScraper::new(Behaviour::Succeed), Some(analyzer)),
        RateLimitState::new(1, Duration::from_secs(60)),
    );
    let body = json!({ "data": sample_scrape("wanderwithmira") });

    let first = app
        .clone()
        .oneshot(post_json("/api/v1/analyze", &body))
        .await
        .expect("response");
    let second = app
        .oneshot(post_json("/api/v1/analyze", &body))
        .await
        .expect("response");

    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    let requests = server.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 1);
}

#[tokio::test]
async fn create_profile_returns_record_when_persist_fails() {
    // The lazy pool never connects: the stored-record lookup and the inline
    // write both fail, and the computed record is still returned.
    let (_server, analyzer) = gemini(ANALYSIS_REPLY).await;
    let scraper = FakeScraper::new(Behaviour::Succeed);
    let response = app(state(lazy_pool(), scraper.clone(), Some(analyzer)))
        .oneshot(post_json(
            "/api/v1/profiles",
            &json!({ "username": "wanderwithmira" }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let json = read_json(response).await;
    assert_eq!(json["data"]["insta_username"], "wanderwithmira");
    assert_eq!(json["data"]["category"], "Travel");
    assert_eq!(json["data"]["cached"], false);
    assert_eq!(json["data"]["reponse"]["ratings"]["engagement"]["score"], "8/10");
    assert_eq!(scraper.calls(), 1);
}

// -------------------------------------------------------------------------
// Profiles, categories, health (with DB)
// -------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn create_profile_scrapes_analyzes_and_persists(pool: PgPool) {
    let (_server, analyzer) = gemini(ANALYSIS_REPLY).await;
    let scraper = FakeScraper::new(Behaviour::Succeed);
    let app = app(state(pool.clone(), scraper.clone(), Some(analyzer)));

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/v1/profiles",
            &json!({ "username": "wanderwithmira" }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let json = read_json(response).await;
    assert_eq!(json["data"]["insta_username"], "wanderwithmira");
    assert_eq!(json["data"]["category"], "Travel");
    assert_eq!(json["data"]["cached"], false);
    assert_eq!(
        json["data"]["scrapped_data"]["userInfo"]["username"],
        "wanderwithmira"
    );
    assert_eq!(json["data"]["reponse"]["ratings"]["engagement"]["score"], "8/10");

    let row = reelscout_db::get_profile_analysis(&pool, "wanderwithmira")
        .await
        .expect("query")
        .expect("row persisted");
    assert_eq!(row.category.as_deref(), Some("Travel"));

    let detail = app
        .clone()
        .oneshot(get_request("/api/v1/profiles/wanderwithmira"))
        .await
        .expect("response");
    assert_eq!(detail.status(), StatusCode::OK);
    assert_eq!(read_json(detail).await["data"]["cached"], true);

    let list = app
        .clone()
        .oneshot(get_request("/api/v1/profiles?limit=10"))
        .await
        .expect("response");
    let list = read_json(list).await;
    let first = &list["data"][0];
    assert_eq!(first["insta_username"], "wanderwithmira");
    assert_eq!(first["follower_count"], 48_300);
    assert_eq!(first["engagement_score"], "8/10");

    let categories = app
        .oneshot(get_request("/api/v1/categories"))
        .await
        .expect("response");
    assert_eq!(read_json(categories).await["data"], json!(["Travel"]));
}

#[sqlx::test(migrations = "../../migrations")]
async fn create_profile_reuses_stored_record_unless_refreshed(pool: PgPool) {
    let (_server, analyzer) = gemini(ANALYSIS_REPLY).await;
    let scraper = FakeScraper::new(Behaviour::Succeed);
    let app = app(state(pool, scraper.clone(), Some(analyzer)));
    let body = json!({ "username": "wanderwithmira" });

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(post_json("/api/v1/profiles", &body))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }
    assert_eq!(scraper.calls(), 1);

    let refreshed = app
        .oneshot(post_json(
            "/api/v1/profiles",
            &json!({ "username": "wanderwithmira", "refresh": true }),
        ))
        .await
        .expect("response");
    assert_eq!(refreshed.status(), StatusCode::OK);
    assert_eq!(read_json(refreshed).await["data"]["cached"], false);
    assert_eq!(scraper.calls(), 2);
}

#[sqlx::test(migrations = "../../migrations")]
async fn create_profile_without_analyzer_does_not_scrape(pool: PgPool) {
    let scraper = FakeScraper::new(Behaviour::Succeed);
    let response = app(state(pool, scraper.clone(), None))
        .oneshot(post_json(
            "/api/v1/profiles",
            &json!({ "username": "wanderwithmira" }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(scraper.calls(), 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn get_profile_returns_404_for_unknown_handle(pool: PgPool) {
    let response = app(state(pool, FakeScraper::new(Behaviour::Succeed), None))
        .oneshot(get_request("/api/v1/profiles/nobody.here"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(read_json(response).await["code"], "not_found");
}

#[sqlx::test(migrations = "../../migrations")]
async fn list_profiles_filters_by_category(pool: PgPool) {
    for (handle, category) in [("alpha", "Travel"), ("bravo", "Food"), ("charlie", "Travel")] {
        let scraped = sample_scrape(handle);
        reelscout_db::upsert_profile_analysis(
            &pool,
            &reelscout_db::NewProfileAnalysis {
                insta_username: handle,
                scraped_data: &scraped,
                analysis: &json!({}),
                category: Some(category),
            },
        )
        .await
        .expect("seed");
    }

    let response = app(state(pool, FakeScraper::new(Behaviour::Succeed), None))
        .oneshot(get_request("/api/v1/profiles?category=Travel"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let json = read_json(response).await;
    let mut handles: Vec<&str> = json["data"]
        .as_array()
        .expect("data array")
        .iter()
        .filter_map(|r| r["insta_username"].as_str())
        .collect();
    handles.sort_unstable();
    assert_eq!(handles, vec!["alpha", "charlie"]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn health_reports_database_ok(pool: PgPool) {
    let response = app(state(pool, FakeScraper::new(Behaviour::Succeed), None))
        .oneshot(get_request("/api/v1/health"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["data"]["status"], "ok");
}
