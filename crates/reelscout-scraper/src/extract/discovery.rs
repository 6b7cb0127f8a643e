use reelscout_core::MAX_POSTS;
use reqwest::Url;
use scraper::Html;

use super::{resolve_http, selector};

pub(crate) const POST_LINKS: &[&str] = &[
    r#"article a[href*="/reel/"]"#,
    r#"a[href*="/reel/"]"#,
    r#"a[href*="/p/"]"#,
    r#"div[role="button"] a[href*="/reel/"]"#,
    r#"div.x1qjc9v5 a[href*="/reel/"]"#,
    "div._aagw a",
];

/// Collect up to [`MAX_POSTS`] distinct post URLs from a listing page.
///
/// Matches of every selector are unioned in selector order; a page without
/// post links yields an empty list.
#[must_use]
pub fn discover_post_urls(html: &str, listing_url: &str) -> Vec<String> {
    let doc = Html::parse_document(html);
    let base = Url::parse(listing_url).ok();
    let mut urls: Vec<String> = Vec::new();

    for css in POST_LINKS {
        let Some(sel) = selector(css) else {
            continue;
        };
        for anchor in doc.select(&sel) {
            let Some(url) = anchor
                .value()
                .attr("href")
                .and_then(|href| resolve_http(base.as_ref(), href))
            else {
                continue;
            };
            if !is_post_path(url.path()) {
                continue;
            }
            let url = String::from(url);
            if !urls.contains(&url) {
                urls.push(url);
            }
        }
    }

    urls.truncate(MAX_POSTS);
    urls
}

fn is_post_path(path: &str) -> bool {
    path.contains("/reel/") || path.contains("/p/")
}
