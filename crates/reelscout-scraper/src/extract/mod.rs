//! Selector fallback chains evaluated against an HTML snapshot.
//!
//! Everything here is synchronous and works on `&str` markup: `scraper::Html`
//! is not `Send`, so documents are parsed, read and dropped between awaits.

pub mod discovery;
pub mod post;
pub mod profile;

use reqwest::Url;
use scraper::{ElementRef, Selector};

pub use discovery::discover_post_urls;
pub use post::extract_post;
pub use profile::extract_profile;

/// One way of reading a field out of the markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Trimmed text content of the first element matching the selector.
    Text(&'static str),
    /// Trimmed value of an attribute on the first element matching the selector.
    Attr(&'static str, &'static str),
    /// Trimmed text of the first match with no descendant matching the second
    /// selector.
    TextWithout(&'static str, &'static str),
}

/// Evaluate `rules` in order below `scope` and return the first non-empty
/// value. Rules with unparseable selectors are skipped.
#[must_use]
pub fn first_match(scope: ElementRef<'_>, rules: &[Rule]) -> Option<String> {
    rules.iter().find_map(|rule| apply(scope, *rule))
}

fn apply(scope: ElementRef<'_>, rule: Rule) -> Option<String> {
    match rule {
        Rule::Text(css) => {
            let sel = selector(css)?;
            scope
                .select(&sel)
                .next()
                .map(text_of)
                .filter(|text| !text.is_empty())
        }
        Rule::Attr(css, attr) => {
            let sel = selector(css)?;
            scope
                .select(&sel)
                .next()
                .and_then(|el| el.value().attr(attr))
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        }
        Rule::TextWithout(css, excluded) => {
            let sel = selector(css)?;
            let excluded = selector(excluded)?;
            scope
                .select(&sel)
                .find(|el| el.select(&excluded).next().is_none())
                .map(text_of)
                .filter(|text| !text.is_empty())
        }
    }
}

/// Parse a CSS selector, logging and discarding invalid ones.
pub(crate) fn selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(selector) => Some(selector),
        Err(e) => {
            tracing::debug!(selector = css, error = %e, "skipping invalid selector");
            None
        }
    }
}

pub(crate) fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Resolve `href` against `base`, keeping only `http(s)` results.
pub(crate) fn resolve_http(base: Option<&Url>, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    let url = match base {
        Some(base) => base.join(href).ok()?,
        None => Url::parse(href).ok()?,
    };
    matches!(url.scheme(), "http" | "https").then_some(url)
}

/// `true` for `instagram.com` and any of its subdomains.
pub(crate) fn is_target_site(url: &Url) -> bool {
    url.host_str().is_some_and(|host| {
        let host = host.to_ascii_lowercase();
        host == "instagram.com" || host.ends_with(".instagram.com")
    })
}
