use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Account used for the target-site login form.
#[derive(Clone)]
pub struct LoginCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .finish()
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub gemini_timeout_secs: u64,
    pub login: Option<LoginCredentials>,
    pub chrome_executable: Option<PathBuf>,
    pub browser_headless: bool,
    pub user_agent: String,
    pub profile_timeout_secs: u64,
    pub post_timeout_secs: u64,
    pub settle_delay_ms: u64,
    pub scroll_iterations: u32,
    pub scroll_delay_ms: u64,
    pub pipeline_timeout_secs: u64,
    pub post_pacing_ms: u64,
    pub scrape_rate_limit: usize,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field(
                "gemini_api_key",
                &self.gemini_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("gemini_model", &self.gemini_model)
            .field("gemini_base_url", &self.gemini_base_url)
            .field("gemini_timeout_secs", &self.gemini_timeout_secs)
            .field("login", &self.login)
            .field("chrome_executable", &self.chrome_executable)
            .field("browser_headless", &self.browser_headless)
            .field("user_agent", &self.user_agent)
            .field("profile_timeout_secs", &self.profile_timeout_secs)
            .field("post_timeout_secs", &self.post_timeout_secs)
            .field("settle_delay_ms", &self.settle_delay_ms)
            .field("scroll_iterations", &self.scroll_iterations)
            .field("scroll_delay_ms", &self.scroll_delay_ms)
            .field("pipeline_timeout_secs", &self.pipeline_timeout_secs)
            .field("post_pacing_ms", &self.post_pacing_ms)
            .field("scrape_rate_limit", &self.scrape_rate_limit)
            .finish()
    }
}
