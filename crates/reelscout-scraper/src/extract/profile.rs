use reelscout_core::ProfileRecord;
use reqwest::Url;
use scraper::Html;

use super::{first_match, is_target_site, resolve_http, selector, text_of, Rule};

pub(crate) const BIO: &[Rule] = &[
    Rule::Text(r#"div[class*="x7a106z"] span"#),
    Rule::Text(r#"div[class*="x1qjc9v5"] span"#),
    Rule::Text("header section span"),
    Rule::Text(r#"span[class*="x1lliihq"]"#),
];

pub(crate) const DISPLAY_NAME: &[Rule] = &[
    Rule::Text(r#"h1[class*="x1lliihq"]"#),
    Rule::Text(r#"h2[class*="x1lliihq"]"#),
    Rule::Text("header h1"),
    Rule::Text("header h2"),
];

pub(crate) const AVATAR: &[Rule] = &[
    Rule::Attr(r#"img[class*="xpdipgo"]"#, "src"),
    Rule::Attr("header img", "src"),
    Rule::Attr(r#"img[alt*="profile"]"#, "src"),
    Rule::Attr(r#"img[src*="profile"]"#, "src"),
];

const STAT_SPANS: &str = "ul li span";

/// Build the profile record from a loaded profile page.
///
/// `page_url` is where the browser actually ended up; `requested_handle` is
/// the last-resort username.
#[must_use]
pub fn extract_profile(html: &str, page_url: &str, requested_handle: &str) -> ProfileRecord {
    let doc = Html::parse_document(html);
    let root = doc.root_element();
    let base = Url::parse(page_url).ok();

    let name = first_match(root, DISPLAY_NAME).unwrap_or_default();
    let username = [
        base.as_ref()
            .map(|url| url.path().replace('/', ""))
            .unwrap_or_default(),
        name.clone(),
        requested_handle.to_string(),
    ]
    .into_iter()
    .find(|candidate| !candidate.is_empty())
    .unwrap_or_default();

    let mut profile = ProfileRecord {
        username,
        name,
        bio_text: first_match(root, BIO).unwrap_or_default(),
        profile_image: first_match(root, AVATAR)
            .and_then(|src| resolve_http(base.as_ref(), &src))
            .map(String::from)
            .unwrap_or_default(),
        links: external_links(&doc, base.as_ref()),
        ..ProfileRecord::default()
    };

    if let Some(sel) = selector(STAT_SPANS) {
        for span in doc.select(&sel) {
            let text = text_of(span);
            let lower = text.to_lowercase();
            if lower.contains("follower") {
                profile.followers = Some(text);
            } else if lower.contains("following") {
                profile.following = Some(text);
            } else if lower.contains("post") {
                profile.posts = Some(text);
            }
        }
    }

    profile
}

/// Off-site `http(s)` links in first-seen order, without duplicates.
fn external_links(doc: &Html, base: Option<&Url>) -> Vec<String> {
    let Some(sel) = selector("a[href]") else {
        return Vec::new();
    };
    let mut links: Vec<String> = Vec::new();
    for anchor in doc.select(&sel) {
        let Some(url) = anchor
            .value()
            .attr("href")
            .and_then(|href| resolve_http(base, href))
        else {
            continue;
        };
        if is_target_site(&url) {
            continue;
        }
        let url = String::from(url);
        if !links.contains(&url) {
            links.push(url);
        }
    }
    links
}

#[cfg(test)]
#[path = "profile_test.rs"]
mod tests;
