use crate::app_config::{AppConfig, Environment, LoginCredentials};
use crate::ConfigError;

const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so tests can drive it with a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;
    use std::str::FromStr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    fn parse_as<T>(var: &str, raw: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        raw.trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    }

    let parse_u32 =
        |var: &str, default: &str| -> Result<u32, ConfigError> { parse_as(var, &or_default(var, default)) };
    let parse_u64 =
        |var: &str, default: &str| -> Result<u64, ConfigError> { parse_as(var, &or_default(var, default)) };
    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        parse_as(var, &or_default(var, default))
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("REELSCOUT_ENV", "development"));
    let bind_addr: SocketAddr = parse_as(
        "REELSCOUT_BIND_ADDR",
        &or_default("REELSCOUT_BIND_ADDR", "0.0.0.0:3000"),
    )?;
    let log_level = or_default("REELSCOUT_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("REELSCOUT_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("REELSCOUT_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("REELSCOUT_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let gemini_api_key = optional("GEMINI_API_KEY");
    let gemini_model = or_default("REELSCOUT_GEMINI_MODEL", "gemini-2.0-flash");
    let gemini_base_url = or_default("REELSCOUT_GEMINI_BASE_URL", DEFAULT_GEMINI_BASE_URL);
    let gemini_timeout_secs = parse_u64("REELSCOUT_GEMINI_TIMEOUT_SECS", "120")?;

    let login = match (optional("INSTAGRAM_USERNAME"), optional("INSTAGRAM_PASSWORD")) {
        (Some(username), Some(password)) => Some(LoginCredentials { username, password }),
        _ => None,
    };

    let chrome_executable = optional("REELSCOUT_CHROME_EXECUTABLE").map(PathBuf::from);
    let browser_headless = parse_bool(
        "REELSCOUT_BROWSER_HEADLESS",
        &or_default("REELSCOUT_BROWSER_HEADLESS", "true"),
    )?;
    let user_agent = or_default("REELSCOUT_USER_AGENT", DEFAULT_USER_AGENT);

    let profile_timeout_secs = parse_u64("REELSCOUT_PROFILE_TIMEOUT_SECS", "60")?;
    let post_timeout_secs = parse_u64("REELSCOUT_POST_TIMEOUT_SECS", "30")?;
    let settle_delay_ms = parse_u64("REELSCOUT_SETTLE_DELAY_MS", "5000")?;
    let scroll_iterations = parse_u32("REELSCOUT_SCROLL_ITERATIONS", "5")?;
    let scroll_delay_ms = parse_u64("REELSCOUT_SCROLL_DELAY_MS", "2000")?;
    let pipeline_timeout_secs = parse_u64("REELSCOUT_PIPELINE_TIMEOUT_SECS", "300")?;
    let post_pacing_ms = parse_u64("REELSCOUT_POST_PACING_MS", "750")?;
    let scrape_rate_limit = parse_usize("REELSCOUT_SCRAPE_RATE_LIMIT", "6")?;

    if pipeline_timeout_secs == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "REELSCOUT_PIPELINE_TIMEOUT_SECS".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        gemini_api_key,
        gemini_model,
        gemini_base_url,
        gemini_timeout_secs,
        login,
        chrome_executable,
        browser_headless,
        user_agent,
        profile_timeout_secs,
        post_timeout_secs,
        settle_delay_ms,
        scroll_iterations,
        scroll_delay_ms,
        pipeline_timeout_secs,
        post_pacing_ms,
        scrape_rate_limit,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

fn parse_bool(var: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: format!("expected a boolean, got '{other}'"),
        }),
    }
}
