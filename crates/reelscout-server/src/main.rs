mod api;
mod middleware;
mod persist;
mod scraping;

use std::sync::Arc;
use std::time::Duration;

use reelscout_analyzer::GeminiClient;
use reelscout_scraper::{BrowserOptions, ChromeLauncher, ScrapeConfig, Scraper, SessionManager};
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, AppState},
    middleware::RateLimitState,
    persist::RetryPolicy,
    scraping::PgCredentialStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(reelscout_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = reelscout_db::PoolConfig::from_app_config(&config);
    let pool = reelscout_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = reelscout_db::run_migrations(&pool).await?;
    tracing::info!(applied, "migrations up to date");

    let scrape_config = ScrapeConfig::from_app_config(&config);
    if config.login.is_none() {
        tracing::warn!("INSTAGRAM_USERNAME/INSTAGRAM_PASSWORD not set; scrapes without a stored session run logged out");
    }
    let session = SessionManager::new(
        PgCredentialStore::new(pool.clone()),
        config.login.clone(),
        scrape_config.profile_timeout,
        scrape_config.settle_delay,
    );
    let launcher = ChromeLauncher::new(BrowserOptions::from_app_config(&config));
    let scraper = Scraper::new(launcher, session, scrape_config);

    let analyzer = match config.gemini_api_key.as_deref() {
        Some(key) => Some(Arc::new(GeminiClient::with_base_url(
            key,
            &config.gemini_model,
            config.gemini_timeout_secs,
            &config.gemini_base_url,
        )?)),
        None => {
            tracing::warn!("GEMINI_API_KEY not set; analysis endpoints will fail");
            None
        }
    };

    let state = AppState {
        pool,
        scraper: Arc::new(scraper),
        analyzer,
        persist_retry: RetryPolicy::default(),
    };
    let rate_limit = RateLimitState::new(config.scrape_rate_limit, Duration::from_secs(60));
    let app = build_app(state, rate_limit);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, env = %config.env, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
