use std::sync::LazyLock;

use regex::Regex;
use reelscout_core::{CommentRecord, PostRecord, MAX_COMMENTS};
use reqwest::Url;
use scraper::{ElementRef, Html};

use super::{first_match, selector, text_of, Rule};

pub(crate) const CAPTION: &[Rule] = &[
    Rule::Text("div._a9zs"),
    Rule::Text(r#"div[class*="x193iq5w"] span"#),
    Rule::Text("h1 + div span"),
    Rule::Text("article div > span"),
];

pub(crate) const LIKE_CANDIDATES: &[&str] = &[
    r#"section span[role="button"]"#,
    "section div > span",
    "section div._aacl._aaco._aacw",
    r#"section div[role="button"] span"#,
];

pub(crate) const COMMENT_CONTAINERS: &[&str] = &[
    "ul > div > li",
    r#"ul div[role="button"]"#,
    "div._a9zr",
    "div._a9zs",
];

const COMMENT_AUTHOR: &[Rule] = &[Rule::Text("a")];
const COMMENT_TEXT: &[Rule] = &[Rule::TextWithout("span", "a"), Rule::Text("div._a9zs")];
const COMMENT_LIKES: &[Rule] = &[Rule::Text(r#"button[type="button"] span"#)];

const MEDIA_URL: &[Rule] = &[Rule::Attr("video", "src")];
const POSTER: &[Rule] = &[Rule::Attr("video", "poster")];
const OG_IMAGE: &[Rule] = &[Rule::Attr(r#"meta[property="og:image"]"#, "content")];

/// Thumbnails smaller than this in either dimension are icons or avatars.
const MIN_THUMBNAIL_PX: u32 = 200;

static LIKE_COUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\d[\d,.]*\s*[kmb]?\s*likes?\b").expect("valid like-count regex")
});

static LIKE_WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\blikes?\b").expect("valid like-word regex"));

/// Build the post record from a loaded post page.
#[must_use]
pub fn extract_post(html: &str, post_url: &str) -> PostRecord {
    let doc = Html::parse_document(html);
    let root = doc.root_element();
    let base = Url::parse(post_url).ok();

    PostRecord {
        url: post_url.to_string(),
        thumbnail: thumbnail(&doc).map(|src| absolutize(base.as_ref(), src)),
        video_url: first_match(root, MEDIA_URL),
        caption: first_match(root, CAPTION).unwrap_or_default(),
        like_count: like_count(&doc).unwrap_or_else(|| CommentRecord::NO_LIKES.to_string()),
        post_date: post_date(&doc).unwrap_or_default(),
        comments: comments(&doc),
    }
}

fn thumbnail(doc: &Html) -> Option<String> {
    let root = doc.root_element();
    if let Some(poster) = first_match(root, POSTER) {
        return Some(poster);
    }

    let large_image = selector("img").and_then(|sel| {
        doc.select(&sel).find_map(|img| {
            let attrs = img.value();
            let dimension = |name: &str| {
                attrs
                    .attr(name)
                    .and_then(|v| v.trim().parse::<u32>().ok())
                    .unwrap_or(0)
            };
            let src = attrs.attr("src").map(str::trim).unwrap_or_default();
            (dimension("width") > MIN_THUMBNAIL_PX
                && dimension("height") > MIN_THUMBNAIL_PX
                && !src.is_empty()
                && !src.contains("profile"))
            .then(|| src.to_string())
        })
    });

    large_image.or_else(|| first_match(root, OG_IMAGE))
}

fn absolutize(base: Option<&Url>, src: String) -> String {
    base.and_then(|base| base.join(&src).ok())
        .map_or(src, String::from)
}

/// Raw like-count text, e.g. `"1,234"` or `"1.2K"`.
fn like_count(doc: &Html) -> Option<String> {
    LIKE_CANDIDATES.iter().find_map(|css| {
        let sel = selector(css)?;
        doc.select(&sel).find_map(|el| {
            let text = text_of(el);
            LIKE_COUNT_RE.is_match(&text).then(|| {
                LIKE_WORD_RE.replace_all(&text, "").trim().to_string()
            })
        })
    })
}

fn post_date(doc: &Html) -> Option<String> {
    let sel = selector("time")?;
    let time = doc.select(&sel).next()?;
    time.value()
        .attr("datetime")
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .or_else(|| Some(text_of(time)))
}

fn comments(doc: &Html) -> Vec<CommentRecord> {
    let containers: Vec<ElementRef<'_>> = COMMENT_CONTAINERS
        .iter()
        .filter_map(|css| selector(css))
        .map(|sel| doc.select(&sel).take(MAX_COMMENTS).collect::<Vec<_>>())
        .find(|found| !found.is_empty())
        .unwrap_or_default();

    containers.into_iter().map(comment).collect()
}

fn comment(container: ElementRef<'_>) -> CommentRecord {
    CommentRecord {
        username: first_match(container, COMMENT_AUTHOR)
            .unwrap_or_else(|| CommentRecord::UNKNOWN_AUTHOR.to_string()),
        text: first_match(container, COMMENT_TEXT)
            .unwrap_or_else(|| CommentRecord::NO_TEXT.to_string()),
        likes: first_match(container, COMMENT_LIKES)
            .unwrap_or_else(|| CommentRecord::NO_LIKES.to_string()),
    }
}

#[cfg(test)]
#[path = "post_test.rs"]
mod tests;
