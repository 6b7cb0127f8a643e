//! Scrape records exchanged between the scraper, the analyzer, and storage.
//!
//! Field names serialize in the camelCase shape the dashboard already reads
//! (`userInfo`, `bioText`, `likeCount`, ...).

use serde::{Deserialize, Serialize};

/// Upper bound on post records in one [`ScrapeResult`].
pub const MAX_POSTS: usize = 5;

/// Upper bound on comment records attached to one [`PostRecord`].
pub const MAX_COMMENTS: usize = 10;

/// The stored authentication cookie for the target site.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCredential {
    pub sessionid: String,
}

impl SessionCredential {
    #[must_use]
    pub fn new(sessionid: impl Into<String>) -> Self {
        Self {
            sessionid: sessionid.into(),
        }
    }

    /// Parses the persisted JSON form. Blank or malformed values yield `None`.
    #[must_use]
    pub fn from_json(raw: &str) -> Option<Self> {
        serde_json::from_str::<Self>(raw)
            .ok()
            .filter(|c| !c.sessionid.trim().is_empty())
    }

    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::json!({ "sessionid": self.sessionid }).to_string()
    }
}

impl std::fmt::Debug for SessionCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCredential")
            .field("sessionid", &"[redacted]")
            .finish()
    }
}

/// Profile metadata scraped from the profile page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    pub username: String,
    pub name: String,
    pub bio_text: String,
    pub profile_image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub followers: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub following: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posts: Option<String>,
    #[serde(default)]
    pub links: Vec<String>,
}

/// One comment under a post. Any field may hold its placeholder default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRecord {
    pub username: String,
    pub text: String,
    pub likes: String,
}

impl CommentRecord {
    pub const UNKNOWN_AUTHOR: &'static str = "Unknown";
    pub const NO_TEXT: &'static str = "No text";
    pub const NO_LIKES: &'static str = "0";
}

/// One scraped video post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRecord {
    pub url: String,
    pub thumbnail: Option<String>,
    pub video_url: Option<String>,
    pub caption: String,
    /// Raw like-count text as displayed, e.g. `"1,234"` or `"1.2K"`.
    pub like_count: String,
    pub post_date: String,
    #[serde(default)]
    pub comments: Vec<CommentRecord>,
}

/// One profile plus its most recent posts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeResult {
    pub user_info: ProfileRecord,
    #[serde(default)]
    pub reels: Vec<PostRecord>,
}

impl ScrapeResult {
    /// Builds a result, enforcing the post/comment caps and URL uniqueness.
    #[must_use]
    pub fn new(user_info: ProfileRecord, reels: Vec<PostRecord>) -> Self {
        let mut seen = std::collections::HashSet::new();
        let reels = reels
            .into_iter()
            .filter(|post| seen.insert(post.url.clone()))
            .take(MAX_POSTS)
            .map(|mut post| {
                post.comments.truncate(MAX_COMMENTS);
                post
            })
            .collect();
        Self { user_info, reels }
    }

    #[must_use]
    pub fn handle(&self) -> &str {
        &self.user_info.username
    }
}
