use thiserror::Error;

pub mod app_config;
pub mod config;
pub mod counts;
pub mod handle;
pub mod records;

pub use app_config::{AppConfig, Environment, LoginCredentials};
pub use config::{load_app_config, load_app_config_from_env};
pub use counts::parse_count;
pub use handle::normalize_handle;
pub use records::{
    CommentRecord, PostRecord, ProfileRecord, ScrapeResult, SessionCredential, MAX_COMMENTS,
    MAX_POSTS,
};

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid handle \"{handle}\": {reason}")]
    InvalidHandle { handle: String, reason: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
