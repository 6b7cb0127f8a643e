//! Glue between the HTTP layer and the scraper: an object-safe scrape entry
//! point and the Postgres-backed session credential store.

use futures::future::BoxFuture;
use reelscout_core::{ScrapeResult, SessionCredential};
use reelscout_scraper::{
    BrowserLauncher, CredentialStore, Scraper, ScraperError, StoredCredential,
};
use sqlx::PgPool;

/// Runs one profile scrape. Boxed so handlers can hold any implementation.
pub trait ProfileScraper: Send + Sync {
    fn scrape_profile<'a>(
        &'a self,
        handle: &'a str,
    ) -> BoxFuture<'a, Result<ScrapeResult, ScraperError>>;
}

impl<L, S> ProfileScraper for Scraper<L, S>
where
    L: BrowserLauncher + 'static,
    S: CredentialStore + 'static,
{
    fn scrape_profile<'a>(
        &'a self,
        handle: &'a str,
    ) -> BoxFuture<'a, Result<ScrapeResult, ScraperError>> {
        Box::pin(self.scrape(handle))
    }
}

/// Session credential persisted in the `session_credentials` singleton row.
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl CredentialStore for PgCredentialStore {
    async fn load(&self) -> Result<StoredCredential, ScraperError> {
        let row = reelscout_db::get_session_cookie(&self.pool)
            .await
            .map_err(|e| ScraperError::CredentialStore(e.to_string()))?;

        let credential = row.cookie.as_deref().and_then(|raw| {
            let parsed = SessionCredential::from_json(raw);
            if parsed.is_none() {
                tracing::warn!(version = row.version, "stored session cookie is unreadable");
            }
            parsed
        });

        Ok(StoredCredential {
            version: row.version,
            credential,
        })
    }

    async fn compare_and_swap(
        &self,
        credential: &SessionCredential,
        expected_version: i64,
    ) -> Result<bool, ScraperError> {
        let written = reelscout_db::compare_and_swap_session_cookie(
            &self.pool,
            &credential.to_json(),
            expected_version,
        )
        .await
        .map_err(|e| ScraperError::CredentialStore(e.to_string()))?;

        Ok(written.is_some())
    }
}
