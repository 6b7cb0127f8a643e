//! HTTP client for the Gemini `generateContent` endpoint.

use std::time::Duration;

use reelscout_core::ScrapeResult;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AnalyzerError;
use crate::prompt::build_prompt;
use crate::response::parse_analysis;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Client for the Gemini REST API.
///
/// Use [`GeminiClient::new`] for production or [`GeminiClient::with_base_url`]
/// to point at a mock server in tests.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: Url,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("model", &self.model)
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"[redacted]")
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [RequestContent<'a>; 1],
}

#[derive(Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: [RequestPart<'a>; 1],
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GeminiClient {
    /// Creates a client pointed at the production API.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyzerError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(api_key: &str, model: &str, timeout_secs: u64) -> Result<Self, AnalyzerError> {
        Self::with_base_url(api_key, model, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL such as
    /// `https://generativelanguage.googleapis.com/v1beta`.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyzerError::Http`] if the `reqwest::Client` cannot be
    /// built, or [`AnalyzerError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        api_key: &str,
        model: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, AnalyzerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("reelscout/0.1 (influencer-analysis)")
            .build()?;

        // Exactly one trailing slash, so joining keeps the version segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let parsed = Url::parse(&normalised).map_err(|e| AnalyzerError::InvalidBaseUrl {
            base_url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            model: model.to_owned(),
            base_url: parsed,
        })
    }

    /// Request an influencer assessment of `data` and parse the reply.
    ///
    /// # Errors
    ///
    /// - [`AnalyzerError::Http`] on network failure.
    /// - [`AnalyzerError::Status`] on a non-2xx reply.
    /// - [`AnalyzerError::EmptyResponse`] when no candidate carries text.
    /// - [`AnalyzerError::Parse`] when the text is not JSON.
    pub async fn analyze(&self, data: &ScrapeResult) -> Result<Value, AnalyzerError> {
        let prompt = build_prompt(data);
        let text = self.generate(&prompt).await?;
        let analysis = parse_analysis(&text)?;
        tracing::info!(
            username = %data.user_info.username,
            posts = data.reels.len(),
            model = %self.model,
            "analysis complete"
        );
        Ok(analysis)
    }

    /// Send one prompt and return the concatenated text of the first
    /// candidate.
    ///
    /// # Errors
    ///
    /// Same as [`GeminiClient::analyze`], minus parsing.
    pub async fn generate(&self, prompt: &str) -> Result<String, AnalyzerError> {
        let url = self.endpoint()?;
        let body = GenerateRequest {
            contents: [RequestContent {
                role: "user",
                parts: [RequestPart { text: prompt }],
            }],
        };

        tracing::debug!(model = %self.model, prompt_chars = prompt.len(), "requesting analysis");
        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(AnalyzerError::Status {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        let parsed: GenerateResponse =
            serde_json::from_str(&text).map_err(|source| AnalyzerError::Parse { source })?;
        reply_text(parsed).ok_or(AnalyzerError::EmptyResponse)
    }

    fn endpoint(&self) -> Result<Url, AnalyzerError> {
        self.base_url
            .join(&format!("models/{}:generateContent", self.model))
            .map_err(|e| AnalyzerError::InvalidBaseUrl {
                base_url: self.base_url.to_string(),
                reason: e.to_string(),
            })
    }
}

fn reply_text(response: GenerateResponse) -> Option<String> {
    let content = response.candidates.into_iter().next()?.content?;
    let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
    (!text.trim().is_empty()).then_some(text)
}

/// Gemini error bodies look like `{"error": {"message": "..."}}`.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.pointer("/error/message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.chars().take(200).collect())
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
