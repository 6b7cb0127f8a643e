use reelscout_core::{normalize_handle, ScrapeResult};

use crate::aggregator::collect_posts;
use crate::browser::{BrowserLauncher, BrowserPage};
use crate::config::ScrapeConfig;
use crate::error::ScraperError;
use crate::extract;
use crate::navigator::Navigator;
use crate::session::{CredentialStore, SessionManager};

/// Runs complete scrapes: one browser per call, closed on every exit path.
pub struct Scraper<L, S> {
    launcher: L,
    session: SessionManager<S>,
    config: ScrapeConfig,
}

impl<L, S> Scraper<L, S>
where
    L: BrowserLauncher,
    S: CredentialStore,
{
    #[must_use]
    pub fn new(launcher: L, session: SessionManager<S>, config: ScrapeConfig) -> Self {
        Self {
            launcher,
            session,
            config,
        }
    }

    /// Scrape a profile and its most recent posts.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::InvalidHandle`] if `handle` is not a valid handle.
    /// - [`ScraperError::Timeout`] if the run exceeds the overall budget.
    /// - Browser or navigation errors from any step.
    pub async fn scrape(&self, handle: &str) -> Result<ScrapeResult, ScraperError> {
        let handle = normalize_handle(handle)?;
        let page = self.launcher.launch().await?;

        let outcome =
            tokio::time::timeout(self.config.pipeline_timeout, self.run(&page, &handle)).await;
        page.close().await;

        match outcome {
            Ok(result) => result,
            Err(_) => {
                let secs = self.config.pipeline_timeout.as_secs();
                tracing::warn!(%handle, secs, "scrape exceeded budget");
                Err(ScraperError::Timeout { secs })
            }
        }
    }

    async fn run<P: BrowserPage>(
        &self,
        page: &P,
        handle: &str,
    ) -> Result<ScrapeResult, ScraperError> {
        let session = self.session.establish(page).await?;
        tracing::info!(handle, session = session.as_str(), "session ready");

        let navigator = Navigator::new(page, &self.config);

        let profile_page = navigator.open_profile(handle).await?;
        let profile = extract::extract_profile(&profile_page.html, &profile_page.url, handle);

        let listing = navigator.open_post_listing(handle).await?;
        let urls = extract::discover_post_urls(&listing.html, &listing.url);
        tracing::info!(handle, posts = urls.len(), "discovered posts");

        let reels = collect_posts(&navigator, &urls, self.config.post_pacing).await?;
        let result = ScrapeResult::new(profile, reels);
        tracing::info!(handle, posts = result.reels.len(), "scrape complete");
        Ok(result)
    }
}
