use std::path::PathBuf;
use std::time::Duration;

use reelscout_core::AppConfig;

/// Navigation budgets and pacing for one scrape.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub profile_timeout: Duration,
    pub post_timeout: Duration,
    pub settle_delay: Duration,
    pub scroll_iterations: u32,
    pub scroll_delay: Duration,
    pub pipeline_timeout: Duration,
    /// Lower bound of the pause between post visits; the actual pause is
    /// drawn from `[post_pacing, 2 * post_pacing]`.
    pub post_pacing: Duration,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            profile_timeout: Duration::from_secs(60),
            post_timeout: Duration::from_secs(30),
            settle_delay: Duration::from_millis(5_000),
            scroll_iterations: 5,
            scroll_delay: Duration::from_millis(2_000),
            pipeline_timeout: Duration::from_secs(300),
            post_pacing: Duration::from_millis(750),
        }
    }
}

impl ScrapeConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            profile_timeout: Duration::from_secs(config.profile_timeout_secs),
            post_timeout: Duration::from_secs(config.post_timeout_secs),
            settle_delay: Duration::from_millis(config.settle_delay_ms),
            scroll_iterations: config.scroll_iterations,
            scroll_delay: Duration::from_millis(config.scroll_delay_ms),
            pipeline_timeout: Duration::from_secs(config.pipeline_timeout_secs),
            post_pacing: Duration::from_millis(config.post_pacing_ms),
        }
    }

    /// Every delay zeroed and generous budgets; used by tests.
    #[must_use]
    pub fn immediate() -> Self {
        Self {
            profile_timeout: Duration::from_secs(5),
            post_timeout: Duration::from_secs(5),
            settle_delay: Duration::ZERO,
            scroll_iterations: 0,
            scroll_delay: Duration::ZERO,
            pipeline_timeout: Duration::from_secs(10),
            post_pacing: Duration::ZERO,
        }
    }
}

/// Options for launching the Chromium process.
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    pub executable: Option<PathBuf>,
    pub headless: bool,
    pub user_agent: String,
    pub window_width: u32,
    pub window_height: u32,
}

impl BrowserOptions {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            executable: config.chrome_executable.clone(),
            headless: config.browser_headless,
            user_agent: config.user_agent.clone(),
            window_width: 1920,
            window_height: 1080,
        }
    }
}
