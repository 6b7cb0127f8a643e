//! Chromium driver over the DevTools protocol.

use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::CookieParam;
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;

use crate::browser::{BrowserLauncher, BrowserPage, CookieSpec};
use crate::config::BrowserOptions;
use crate::error::ScraperError;

/// Injected before any page script runs; hides the usual automation tells.
const STEALTH_SCRIPT: &str = r"
    Object.defineProperty(navigator, 'webdriver', { get: () => undefined });
    Object.defineProperty(navigator, 'languages', { get: () => ['en-US', 'en'] });
    Object.defineProperty(navigator, 'plugins', { get: () => [1, 2, 3, 4, 5] });
    window.chrome = { runtime: {} };
";

#[derive(Debug, Clone)]
pub struct ChromeLauncher {
    options: BrowserOptions,
}

impl ChromeLauncher {
    #[must_use]
    pub fn new(options: BrowserOptions) -> Self {
        Self { options }
    }

    fn browser_config(&self) -> Result<BrowserConfig, ScraperError> {
        let options = &self.options;
        let mut builder = BrowserConfig::builder()
            .window_size(options.window_width, options.window_height)
            .viewport(Some(Viewport {
                width: options.window_width,
                height: options.window_height,
                device_scale_factor: Some(1.0),
                ..Default::default()
            }))
            .no_sandbox()
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-infobars")
            .arg("--disable-features=IsolateOrigins,site-per-process")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg(format!("--user-agent={}", options.user_agent));

        if !options.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &options.executable {
            builder = builder.chrome_executable(path);
        }

        builder.build().map_err(ScraperError::Browser)
    }
}

impl BrowserLauncher for ChromeLauncher {
    type Page = ChromePage;

    async fn launch(&self) -> Result<ChromePage, ScraperError> {
        let config = self.browser_config()?;
        let (mut browser, mut handler) = Browser::launch(config).await?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!(error = %e, "browser handler error");
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                shutdown(&mut browser, handler_task).await;
                return Err(e.into());
            }
        };

        if let Err(e) = page
            .execute(AddScriptToEvaluateOnNewDocumentParams::new(STEALTH_SCRIPT))
            .await
        {
            tracing::warn!(error = %e, "failed to inject stealth script");
        }

        tracing::debug!(headless = self.options.headless, "browser launched");
        Ok(ChromePage {
            browser,
            page,
            handler_task,
        })
    }
}

/// A single tab owning its browser process.
pub struct ChromePage {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
}

impl BrowserPage for ChromePage {
    async fn goto(&self, url: &str) -> Result<(), ScraperError> {
        self.page
            .goto(url)
            .await
            .map_err(|e| ScraperError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    async fn wait_for_network_idle(&self, limit: Duration) {
        let limit_ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX);
        let js = format!(
            r"(async () => {{
                const limitMs = {limit_ms};
                const idleMs = 500;
                const interval = 250;
                const start = Date.now();
                let last = performance.getEntriesByType('resource').length;
                let stable = 0;
                while (Date.now() - start < limitMs) {{
                    await new Promise(r => setTimeout(r, interval));
                    const now = performance.getEntriesByType('resource').length;
                    if (document.readyState === 'complete' && now === last) {{
                        stable += interval;
                        if (stable >= idleMs) return true;
                    }} else {{
                        stable = 0;
                    }}
                    last = now;
                }}
                return false;
            }})()"
        );

        match self.page.evaluate(js).await {
            Ok(result) => {
                let settled = result.into_value::<bool>().unwrap_or(false);
                if !settled {
                    tracing::debug!(limit_ms, "network did not go idle before limit");
                }
            }
            Err(e) => tracing::debug!(error = %e, "network-idle probe failed"),
        }
    }

    async fn current_url(&self) -> Result<String, ScraperError> {
        Ok(self.page.url().await?.unwrap_or_default())
    }

    async fn html(&self) -> Result<String, ScraperError> {
        Ok(self.page.content().await?)
    }

    async fn scroll_by_viewport(&self) -> Result<(), ScraperError> {
        self.page
            .evaluate("window.scrollBy(0, window.innerHeight)")
            .await?;
        Ok(())
    }

    async fn set_cookie(&self, cookie: &CookieSpec) -> Result<(), ScraperError> {
        let param = CookieParam::builder()
            .name(cookie.name.clone())
            .value(cookie.value.clone())
            .domain(cookie.domain.clone())
            .path(cookie.path.clone())
            .build()
            .map_err(ScraperError::Browser)?;
        self.page.set_cookie(param).await?;
        Ok(())
    }

    async fn cookie(&self, name: &str) -> Result<Option<String>, ScraperError> {
        let cookies = self.page.get_cookies().await?;
        Ok(cookies
            .into_iter()
            .find(|c| c.name == name)
            .map(|c| c.value))
    }

    async fn type_into(&self, selector: &str, text: &str) -> Result<(), ScraperError> {
        let element = self.page.find_element(selector).await.map_err(|_| {
            ScraperError::ElementNotFound {
                selector: selector.to_string(),
            }
        })?;
        element.click().await?;
        element.type_str(text).await?;
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<(), ScraperError> {
        let element = self.page.find_element(selector).await.map_err(|_| {
            ScraperError::ElementNotFound {
                selector: selector.to_string(),
            }
        })?;
        element.click().await?;
        Ok(())
    }

    async fn wait_for_navigation(&self) -> Result<(), ScraperError> {
        self.page.wait_for_navigation().await?;
        Ok(())
    }

    async fn close(self) {
        let ChromePage {
            mut browser,
            page,
            handler_task,
        } = self;
        if let Err(e) = page.close().await {
            tracing::debug!(error = %e, "failed to close page");
        }
        shutdown(&mut browser, handler_task).await;
    }
}

async fn shutdown(browser: &mut Browser, handler_task: JoinHandle<()>) {
    if let Err(e) = browser.close().await {
        tracing::warn!(error = %e, "failed to close browser");
    }
    if let Err(e) = browser.wait().await {
        tracing::warn!(error = %e, "failed to reap browser process");
    }
    handler_task.abort();
    tracing::debug!("browser closed");
}
