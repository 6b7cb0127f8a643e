//! Integration tests for `GeminiClient` using wiremock HTTP mocks.

use reelscout_analyzer::{primary_category, AnalyzerError, GeminiClient};
use reelscout_core::{CommentRecord, PostRecord, ProfileRecord, ScrapeResult};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL: &str = "gemini-test";
const ENDPOINT: &str = "/v1beta/models/gemini-test:generateContent";

fn test_client(server: &MockServer) -> GeminiClient {
    GeminiClient::with_base_url("test-key", MODEL, 30, &format!("{}/v1beta", server.uri()))
        .expect("client construction should not fail")
}

fn reply(text: &str) -> serde_json::Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
}

fn profile() -> ProfileRecord {
    ProfileRecord {
        username: "wanderwithmira".to_string(),
        name: "Mira Okafor".to_string(),
        bio_text: "Slow travel & street food".to_string(),
        profile_image: "https://cdn.example/avatar.jpg".to_string(),
        followers: Some("48.3K followers".to_string()),
        following: Some("612 following".to_string()),
        posts: Some("214 posts".to_string()),
        links: vec!["https://linktr.ee/wanderwithmira".to_string()],
    }
}

fn scrape_with_posts() -> ScrapeResult {
    let post = PostRecord {
        url: "https://www.instagram.com/reel/C7aaa111/".to_string(),
        thumbnail: Some("https://cdn.example/poster.jpg".to_string()),
        video_url: None,
        caption: "Lisbon for €20".to_string(),
        like_count: "3,482".to_string(),
        post_date: "2024-06-02T18:21:09.000Z".to_string(),
        comments: vec![CommentRecord {
            username: "tiago.eats".to_string(),
            text: "elite".to_string(),
            likes: "24".to_string(),
        }],
    };
    ScrapeResult::new(profile(), vec![post])
}

#[tokio::test]
async fn fenced_reply_is_stripped_and_parsed() {
    let server = MockServer::start().await;
    let analysis = "```json\n{\n  \"categoryClassification\": {\"primary\": {\"name\": \"Travel\", \"percentage\": \"70%\"}},\n  \"ratings\": {\"engagement\": {\"score\": \"8/10\"}}\n}\n```";

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_string_contains("wanderwithmira"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply(analysis)))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let value = client
        .analyze(&scrape_with_posts())
        .await
        .expect("should parse fenced reply");

    assert_eq!(value["ratings"]["engagement"]["score"], "8/10");
    assert_eq!(primary_category(&value).as_deref(), Some("Travel"));
}

#[tokio::test]
async fn scrape_without_posts_is_still_analyzed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(body_string_contains("Posts analysed: 0"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(reply(r#"{"reelsAnalysis": []}"#)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let data = ScrapeResult::new(profile(), Vec::new());
    let value = client.analyze(&data).await.expect("should analyze");

    assert_eq!(value["reelsAnalysis"], json!([]));
}

#[tokio::test]
async fn non_success_status_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": { "code": 403, "message": "API key not valid", "status": "PERMISSION_DENIED" }
        })))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let err = client
        .analyze(&scrape_with_posts())
        .await
        .expect_err("should fail");

    match err {
        AnalyzerError::Status { status, message } => {
            assert_eq!(status, 403);
            assert_eq!(message, "API key not valid");
        }
        other => panic!("expected Status, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_candidates_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [],
            "promptFeedback": { "blockReason": "SAFETY" }
        })))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let err = client
        .analyze(&scrape_with_posts())
        .await
        .expect_err("should fail");

    assert!(matches!(err, AnalyzerError::EmptyResponse));
}

#[tokio::test]
async fn unparseable_reply_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(reply("Sorry, I can't assess this creator right now.")),
        )
        .mount(&server)
        .await;

    let client = test_client(&server);
    let err = client
        .analyze(&scrape_with_posts())
        .await
        .expect_err("should fail");

    assert!(matches!(err, AnalyzerError::Parse { .. }));
}
