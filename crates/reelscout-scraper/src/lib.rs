pub mod aggregator;
pub mod browser;
pub mod chrome;
pub mod config;
pub mod error;
pub mod extract;
pub mod navigator;
pub mod pipeline;
pub mod session;

pub use browser::{BrowserLauncher, BrowserPage, CookieSpec};
pub use chrome::{ChromeLauncher, ChromePage};
pub use config::{BrowserOptions, ScrapeConfig};
pub use error::ScraperError;
pub use navigator::{Navigator, PageSnapshot};
pub use pipeline::Scraper;
pub use session::{CredentialStore, SessionManager, SessionOutcome, StoredCredential};
