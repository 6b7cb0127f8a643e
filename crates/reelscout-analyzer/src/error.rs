use thiserror::Error;

/// Errors returned while requesting or reading an analysis.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid base URL '{base_url}': {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },

    /// The service answered with a non-2xx status.
    #[error("analysis service returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("analysis service returned no text")]
    EmptyResponse,

    /// The reply text was not JSON, even after stripping code fences.
    #[error("analysis reply is not valid JSON: {source}")]
    Parse {
        #[source]
        source: serde_json::Error,
    },
}
