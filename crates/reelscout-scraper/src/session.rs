//! Authenticated browser sessions against the target site.
//!
//! A stored `sessionid` cookie is reused while it still opens the home page
//! without bouncing to the login form. Otherwise a fresh login runs under a
//! process-wide lock; the store is re-read inside the lock so concurrent
//! requests adopt a cookie another request just obtained instead of logging
//! in again.

use std::future::Future;
use std::time::Duration;

use reelscout_core::{LoginCredentials, SessionCredential};
use tokio::sync::Mutex;

use crate::browser::{BrowserPage, CookieSpec};
use crate::error::ScraperError;

pub const HOME_URL: &str = "https://www.instagram.com/";
pub const LOGIN_URL: &str = "https://www.instagram.com/accounts/login/";
const LOGIN_PATH_MARKER: &str = "/accounts/login/";

const COOKIE_NAME: &str = "sessionid";
const COOKIE_DOMAIN: &str = ".instagram.com";

pub(crate) const USERNAME_INPUT: &str = r#"input[name="username"]"#;
pub(crate) const PASSWORD_INPUT: &str = r#"input[name="password"]"#;
pub(crate) const SUBMIT_BUTTON: &str = r#"button[type="submit"]"#;

/// Snapshot of the persisted credential and its write version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredCredential {
    pub version: i64,
    pub credential: Option<SessionCredential>,
}

/// Persistence for the single session credential.
pub trait CredentialStore: Send + Sync {
    fn load(&self) -> impl Future<Output = Result<StoredCredential, ScraperError>> + Send;

    /// Write `credential` only if the stored version is still
    /// `expected_version`. Returns `false` when another writer got there first.
    fn compare_and_swap(
        &self,
        credential: &SessionCredential,
        expected_version: i64,
    ) -> impl Future<Output = Result<bool, ScraperError>> + Send;
}

/// How the page ended up authenticated (or not).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The stored cookie was still valid.
    Reused,
    /// Another request refreshed the cookie while this one waited.
    Adopted,
    /// This request logged in and stored a new cookie.
    Refreshed,
    /// No usable session; scraping continues logged out.
    Unauthenticated,
}

impl SessionOutcome {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SessionOutcome::Reused => "reused",
            SessionOutcome::Adopted => "adopted",
            SessionOutcome::Refreshed => "refreshed",
            SessionOutcome::Unauthenticated => "unauthenticated",
        }
    }
}

pub struct SessionManager<S> {
    store: S,
    login: Option<LoginCredentials>,
    refresh_lock: Mutex<()>,
    navigation_timeout: Duration,
    settle_delay: Duration,
}

impl<S: CredentialStore> SessionManager<S> {
    #[must_use]
    pub fn new(
        store: S,
        login: Option<LoginCredentials>,
        navigation_timeout: Duration,
        settle_delay: Duration,
    ) -> Self {
        Self {
            store,
            login,
            refresh_lock: Mutex::new(()),
            navigation_timeout,
            settle_delay,
        }
    }

    /// Leave `page` logged in, or report that it could not be.
    ///
    /// # Errors
    ///
    /// Only navigation failures while validating a stored cookie are returned;
    /// every login problem degrades to [`SessionOutcome::Unauthenticated`].
    pub async fn establish<P: BrowserPage>(
        &self,
        page: &P,
    ) -> Result<SessionOutcome, ScraperError> {
        let stored = self.load_or_absent().await;
        let tried = stored.credential;

        if let Some(credential) = &tried {
            if self.try_credential(page, credential).await? {
                tracing::info!("reusing stored session");
                return Ok(SessionOutcome::Reused);
            }
            tracing::info!("stored session expired");
        } else {
            tracing::info!("no stored session");
        }

        let _guard = self.refresh_lock.lock().await;

        let latest = self.load_or_absent().await;
        if let Some(candidate) = latest
            .credential
            .as_ref()
            .filter(|c| Some(*c) != tried.as_ref())
        {
            if self.try_credential(page, candidate).await? {
                tracing::info!(version = latest.version, "adopted session refreshed by another request");
                return Ok(SessionOutcome::Adopted);
            }
        }

        let Some(login) = &self.login else {
            tracing::warn!("login credentials not configured; continuing unauthenticated");
            return Ok(SessionOutcome::Unauthenticated);
        };

        let credential = match self.log_in(page, login).await {
            // The form may leave the rejected cookie in place; that is not a login.
            Ok(Some(credential))
                if Some(&credential) == tried.as_ref()
                    || Some(&credential) == latest.credential.as_ref() =>
            {
                tracing::warn!("login left the rejected session cookie; continuing unauthenticated");
                return Ok(SessionOutcome::Unauthenticated);
            }
            Ok(Some(credential)) => credential,
            Ok(None) => {
                tracing::warn!("login finished without a session cookie; continuing unauthenticated");
                return Ok(SessionOutcome::Unauthenticated);
            }
            Err(e) => {
                tracing::warn!(error = %e, "login failed; continuing unauthenticated");
                return Ok(SessionOutcome::Unauthenticated);
            }
        };

        match self.store.compare_and_swap(&credential, latest.version).await {
            Ok(true) => tracing::info!("stored refreshed session"),
            Ok(false) => tracing::info!(
                expected_version = latest.version,
                "a newer session was stored concurrently; keeping it"
            ),
            Err(e) => tracing::warn!(error = %e, "failed to store refreshed session"),
        }

        Ok(SessionOutcome::Refreshed)
    }

    async fn load_or_absent(&self) -> StoredCredential {
        match self.store.load().await {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read stored session; treating as absent");
                StoredCredential::default()
            }
        }
    }

    /// Install `credential` and check the home page does not bounce to login.
    async fn try_credential<P: BrowserPage>(
        &self,
        page: &P,
        credential: &SessionCredential,
    ) -> Result<bool, ScraperError> {
        page.set_cookie(&CookieSpec {
            name: COOKIE_NAME.to_string(),
            value: credential.sessionid.clone(),
            domain: COOKIE_DOMAIN.to_string(),
            path: "/".to_string(),
        })
        .await?;

        crate::navigator::goto_within(page, HOME_URL, self.navigation_timeout).await?;
        let landed = page.current_url().await?;
        Ok(!landed.contains(LOGIN_PATH_MARKER))
    }

    async fn log_in<P: BrowserPage>(
        &self,
        page: &P,
        login: &LoginCredentials,
    ) -> Result<Option<SessionCredential>, ScraperError> {
        tracing::info!(username = %login.username, "logging in");
        crate::navigator::goto_within(page, LOGIN_URL, self.navigation_timeout).await?;
        page.type_into(USERNAME_INPUT, &login.username).await?;
        page.type_into(PASSWORD_INPUT, &login.password).await?;
        page.click(SUBMIT_BUTTON).await?;

        tokio::time::timeout(self.navigation_timeout, page.wait_for_navigation())
            .await
            .map_err(|_| ScraperError::NavigationTimeout {
                url: LOGIN_URL.to_string(),
                secs: self.navigation_timeout.as_secs(),
            })??;
        tokio::time::sleep(self.settle_delay).await;

        Ok(page
            .cookie(COOKIE_NAME)
            .await?
            .filter(|value| !value.is_empty())
            .map(SessionCredential::new))
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
