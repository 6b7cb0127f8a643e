use std::time::Duration;

use crate::browser::BrowserPage;
use crate::config::ScrapeConfig;
use crate::error::ScraperError;

const SITE_ROOT: &str = "https://www.instagram.com";

/// The serialized document and the URL the browser ended up on.
#[derive(Debug, Clone)]
pub struct PageSnapshot {
    pub url: String,
    pub html: String,
}

#[must_use]
pub fn profile_url(handle: &str) -> String {
    format!("{SITE_ROOT}/{handle}/")
}

#[must_use]
pub fn listing_url(handle: &str) -> String {
    format!("{SITE_ROOT}/{handle}/reels/")
}

/// Navigate within `budget`, then spend whatever is left of it waiting for
/// the network to settle.
///
/// # Errors
///
/// Returns [`ScraperError::NavigationTimeout`] when the load itself overruns
/// the budget, or the page's own navigation error. An unsettled network is
/// not an error.
pub async fn goto_within<P: BrowserPage>(
    page: &P,
    url: &str,
    budget: Duration,
) -> Result<(), ScraperError> {
    let started = tokio::time::Instant::now();
    tokio::time::timeout(budget, page.goto(url))
        .await
        .map_err(|_| ScraperError::NavigationTimeout {
            url: url.to_string(),
            secs: budget.as_secs(),
        })??;

    let remaining = budget.saturating_sub(started.elapsed());
    if !remaining.is_zero() {
        page.wait_for_network_idle(remaining).await;
    }
    Ok(())
}

/// Drives one page through the profile, listing, and post views.
pub struct Navigator<'a, P> {
    page: &'a P,
    config: &'a ScrapeConfig,
}

impl<'a, P: BrowserPage> Navigator<'a, P> {
    #[must_use]
    pub fn new(page: &'a P, config: &'a ScrapeConfig) -> Self {
        Self { page, config }
    }

    /// # Errors
    ///
    /// Fails if the profile page does not load within the profile budget.
    pub async fn open_profile(&self, handle: &str) -> Result<PageSnapshot, ScraperError> {
        let url = profile_url(handle);
        tracing::debug!(%url, "opening profile");
        goto_within(self.page, &url, self.config.profile_timeout).await?;
        self.snapshot().await
    }

    /// Open the reels listing and scroll to trigger lazy loading.
    ///
    /// # Errors
    ///
    /// Fails if the listing does not load within the profile budget or a
    /// scroll step errors.
    pub async fn open_post_listing(&self, handle: &str) -> Result<PageSnapshot, ScraperError> {
        let url = listing_url(handle);
        tracing::debug!(%url, "opening post listing");
        goto_within(self.page, &url, self.config.profile_timeout).await?;
        tokio::time::sleep(self.config.settle_delay).await;

        for _ in 0..self.config.scroll_iterations {
            self.page.scroll_by_viewport().await?;
            tokio::time::sleep(self.config.scroll_delay).await;
        }

        self.snapshot().await
    }

    /// # Errors
    ///
    /// Fails if the post does not load within the post budget.
    pub async fn open_post(&self, url: &str) -> Result<PageSnapshot, ScraperError> {
        tracing::debug!(%url, "opening post");
        goto_within(self.page, url, self.config.post_timeout).await?;
        tokio::time::sleep(self.config.settle_delay).await;
        self.snapshot().await
    }

    async fn snapshot(&self) -> Result<PageSnapshot, ScraperError> {
        Ok(PageSnapshot {
            url: self.page.current_url().await?,
            html: self.page.html().await?,
        })
    }
}
