//! Seams between the scraping logic and the browser driver.
//!
//! The pipeline only ever talks to [`BrowserPage`]; the Chromium driver lives
//! in [`crate::chrome`] and tests substitute a scripted page.

use std::future::Future;
use std::time::Duration;

use crate::error::ScraperError;

/// A cookie to install before navigating.
#[derive(Clone)]
pub struct CookieSpec {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
}

impl std::fmt::Debug for CookieSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieSpec")
            .field("name", &self.name)
            .field("value", &"[redacted]")
            .field("domain", &self.domain)
            .field("path", &self.path)
            .finish()
    }
}

/// One open browser tab.
///
/// Navigation methods do not enforce budgets themselves; callers wrap them in
/// `tokio::time::timeout`.
pub trait BrowserPage: Send + Sync {
    /// Load `url` and wait for the load event.
    fn goto(&self, url: &str) -> impl Future<Output = Result<(), ScraperError>> + Send;

    /// Wait until the page stops fetching resources, giving up after `limit`.
    /// Never fails; an unsettled page is still usable.
    fn wait_for_network_idle(&self, limit: Duration) -> impl Future<Output = ()> + Send;

    fn current_url(&self) -> impl Future<Output = Result<String, ScraperError>> + Send;

    /// Serialized DOM of the current document.
    fn html(&self) -> impl Future<Output = Result<String, ScraperError>> + Send;

    fn scroll_by_viewport(&self) -> impl Future<Output = Result<(), ScraperError>> + Send;

    fn set_cookie(&self, cookie: &CookieSpec)
        -> impl Future<Output = Result<(), ScraperError>> + Send;

    /// Value of the named cookie for the current page, if set.
    fn cookie(&self, name: &str) -> impl Future<Output = Result<Option<String>, ScraperError>> + Send;

    fn type_into(
        &self,
        selector: &str,
        text: &str,
    ) -> impl Future<Output = Result<(), ScraperError>> + Send;

    fn click(&self, selector: &str) -> impl Future<Output = Result<(), ScraperError>> + Send;

    fn wait_for_navigation(&self) -> impl Future<Output = Result<(), ScraperError>> + Send;

    /// Tear the page (and its browser) down. Errors are logged, not returned.
    fn close(self) -> impl Future<Output = ()> + Send;
}

/// Opens a fresh page in a fresh browser.
pub trait BrowserLauncher: Send + Sync {
    type Page: BrowserPage;

    fn launch(&self) -> impl Future<Output = Result<Self::Page, ScraperError>> + Send;
}
