//! Reading the model's reply: fence stripping, JSON parsing and the derived
//! category.

use serde_json::Value;

use crate::error::AnalyzerError;

const LOGGED_REPLY_CHARS: usize = 500;

/// Remove a leading ```` ```json ```` (or bare ```` ``` ````) line and a
/// trailing ```` ``` ```` from `text`, then trim.
///
/// Text without fences is returned trimmed and otherwise untouched.
#[must_use]
pub fn strip_code_fences(text: &str) -> &str {
    let mut body = text.trim();

    if let Some(rest) = body.strip_prefix("```") {
        body = match rest.find('\n') {
            Some(newline) => &rest[newline + 1..],
            // Single-line reply such as ```json {...}```
            None => rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
        };
    }
    if let Some(rest) = body.trim_end().strip_suffix("```") {
        body = rest;
    }

    body.trim()
}

/// Parse the model's reply into a JSON value.
///
/// Fences are stripped first. If the remainder is not valid JSON, the span
/// from the first `{` to the last `}` is tried before giving up.
///
/// # Errors
///
/// Returns [`AnalyzerError::Parse`] when neither attempt yields valid JSON.
pub fn parse_analysis(text: &str) -> Result<Value, AnalyzerError> {
    let body = strip_code_fences(text);

    let first_error = match serde_json::from_str::<Value>(body) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    if let Some(span) = outermost_object(body) {
        if let Ok(value) = serde_json::from_str::<Value>(span) {
            tracing::debug!("parsed analysis from embedded object");
            return Ok(value);
        }
    }

    tracing::warn!(
        error = %first_error,
        reply = %truncate(text, LOGGED_REPLY_CHARS),
        "analysis reply is not valid JSON"
    );
    Err(AnalyzerError::Parse {
        source: first_error,
    })
}

/// `categoryClassification.primary.name` when it is a non-blank string.
#[must_use]
pub fn primary_category(analysis: &Value) -> Option<String> {
    analysis
        .pointer("/categoryClassification/primary/name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

fn outermost_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
#[path = "response_test.rs"]
mod tests;
