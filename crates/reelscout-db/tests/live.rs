//! Live integration tests for reelscout-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, migrated Postgres database. The path is relative
//! to `crates/reelscout-db/`.

use std::collections::HashSet;

use reelscout_core::{CommentRecord, PostRecord, ProfileRecord, ScrapeResult};
use reelscout_db::{
    compare_and_swap_session_cookie, get_profile_analysis, get_session_cookie, list_categories,
    list_profile_analyses, upsert_profile_analysis, NewProfileAnalysis,
};
use serde_json::json;

fn comment(i: usize) -> CommentRecord {
    CommentRecord {
        username: format!("fan{i}"),
        text: "love this".to_string(),
        likes: "2".to_string(),
    }
}

fn post(url: &str, comments: usize) -> PostRecord {
    PostRecord {
        url: url.to_string(),
        thumbnail: Some("https://cdn.example.com/t.jpg".to_string()),
        video_url: None,
        caption: "caption".to_string(),
        like_count: "1,204".to_string(),
        post_date: "2024-05-01T10:00:00.000Z".to_string(),
        comments: (0..comments).map(comment).collect(),
    }
}

fn scrape(handle: &str) -> ScrapeResult {
    ScrapeResult::new(
        ProfileRecord {
            username: handle.to_string(),
            name: "Some Creator".to_string(),
            bio_text: "travel + food".to_string(),
            profile_image: "https://cdn.example.com/p.jpg".to_string(),
            followers: Some("12.5K followers".to_string()),
            following: None,
            posts: None,
            links: vec!["https://linktr.ee/someone".to_string()],
        },
        vec![
            post("https://www.instagram.com/reel/AAA/", 3),
            post("https://www.instagram.com/reel/BBB/", 0),
        ],
    )
}

fn analysis(category: &str) -> serde_json::Value {
    json!({
        "categoryClassification": { "primary": { "name": category } },
        "ratings": { "engagement": { "score": 8 } }
    })
}

// ---------------------------------------------------------------------------
// session_credentials
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn session_row_is_seeded_empty(pool: sqlx::PgPool) {
    let row = get_session_cookie(&pool).await.expect("seeded row");
    assert!(row.cookie.is_none());
    assert_eq!(row.version, 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn session_cas_rejects_stale_version(pool: sqlx::PgPool) {
    let first = compare_and_swap_session_cookie(&pool, r#"{"sessionid":"one"}"#, 0)
        .await
        .expect("first write");
    assert_eq!(first, Some(1));

    let stale = compare_and_swap_session_cookie(&pool, r#"{"sessionid":"two"}"#, 0)
        .await
        .expect("stale write");
    assert_eq!(stale, None);

    let row = get_session_cookie(&pool).await.expect("row");
    assert_eq!(row.cookie.as_deref(), Some(r#"{"sessionid":"one"}"#));
    assert_eq!(row.version, 1);
}

// ---------------------------------------------------------------------------
// profile_analyses
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn profile_analysis_round_trips(pool: sqlx::PgPool) {
    let result = scrape("someone");
    let analysis = analysis("Travel");
    upsert_profile_analysis(
        &pool,
        &NewProfileAnalysis {
            insta_username: result.handle(),
            scraped_data: &result,
            analysis: &analysis,
            category: Some("Travel"),
        },
    )
    .await
    .expect("upsert");

    let row = get_profile_analysis(&pool, "someone")
        .await
        .expect("query")
        .expect("row exists");
    assert_eq!(row.insta_username, "someone");
    assert_eq!(row.category.as_deref(), Some("Travel"));

    let restored = row.scrape_result().expect("decode");
    let urls: HashSet<_> = restored.reels.iter().map(|r| r.url.clone()).collect();
    let expected: HashSet<_> = result.reels.iter().map(|r| r.url.clone()).collect();
    assert_eq!(urls, expected);
    let comment_counts: Vec<_> = restored.reels.iter().map(|r| r.comments.len()).collect();
    assert_eq!(comment_counts, vec![3, 0]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn upsert_overwrites_existing_handle(pool: sqlx::PgPool) {
    let result = scrape("someone");
    let first = upsert_profile_analysis(
        &pool,
        &NewProfileAnalysis {
            insta_username: "someone",
            scraped_data: &result,
            analysis: &analysis("Travel"),
            category: Some("Travel"),
        },
    )
    .await
    .expect("first upsert");
    let second = upsert_profile_analysis(
        &pool,
        &NewProfileAnalysis {
            insta_username: "someone",
            scraped_data: &result,
            analysis: &analysis("Food"),
            category: Some("Food"),
        },
    )
    .await
    .expect("second upsert");

    assert_eq!(first.id, second.id);
    assert_eq!(second.category.as_deref(), Some("Food"));
    let all = list_profile_analyses(&pool, None, 10).await.expect("list");
    assert_eq!(all.len(), 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn list_filters_by_category_and_categories_are_distinct(pool: sqlx::PgPool) {
    for (handle, category) in [
        ("alpha", Some("Travel")),
        ("bravo", Some("Food")),
        ("charlie", Some("Travel")),
        ("delta", None),
        ("echo", Some("  ")),
    ] {
        let result = scrape(handle);
        upsert_profile_analysis(
            &pool,
            &NewProfileAnalysis {
                insta_username: handle,
                scraped_data: &result,
                analysis: &json!({}),
                category,
            },
        )
        .await
        .expect("upsert");
    }

    let travel = list_profile_analyses(&pool, Some("Travel"), 10)
        .await
        .expect("list");
    let handles: HashSet<_> = travel.iter().map(|r| r.insta_username.as_str()).collect();
    assert_eq!(handles, HashSet::from(["alpha", "charlie"]));

    let limited = list_profile_analyses(&pool, None, 2).await.expect("list");
    assert_eq!(limited.len(), 2);

    let categories = list_categories(&pool).await.expect("categories");
    assert_eq!(categories, vec!["Food".to_string(), "Travel".to_string()]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn missing_profile_is_none(pool: sqlx::PgPool) {
    let row = get_profile_analysis(&pool, "nobody").await.expect("query");
    assert!(row.is_none());
}
