use reelscout_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error(transparent)]
    InvalidHandle(#[from] CoreError),

    #[error("browser error: {0}")]
    Browser(String),

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("navigation to {url} timed out after {secs}s")]
    NavigationTimeout { url: String, secs: u64 },

    #[error("element not found: {selector}")]
    ElementNotFound { selector: String },

    #[error("scrape exceeded its {secs}s budget")]
    Timeout { secs: u64 },

    #[error("credential store error: {0}")]
    CredentialStore(String),
}

impl ScraperError {
    /// `true` for the overall pipeline budget, as opposed to any single
    /// navigation timing out.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, ScraperError::Timeout { .. })
    }
}

impl From<chromiumoxide::error::CdpError> for ScraperError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        ScraperError::Browser(err.to_string())
    }
}
