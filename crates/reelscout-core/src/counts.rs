//! Numeric reading of display counts ("1.2K", "3M", "1,234 likes").
//!
//! Records keep the raw text; this is a separate step for derived fields only.

use std::sync::LazyLock;

use regex::Regex;

static COUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d[\d,]*(?:\.\d+)?)\s*([kmb])?\b").expect("valid count regex")
});

/// Parses the first count in `text`, expanding `K`/`M`/`B` suffixes.
///
/// Returns `None` when `text` contains no digits.
#[must_use]
pub fn parse_count(text: &str) -> Option<u64> {
    let caps = COUNT_RE.captures(text)?;
    let digits = caps.get(1)?.as_str().replace(',', "");
    let value: f64 = digits.parse().ok()?;
    let multiplier = match caps
        .get(2)
        .map(|m| m.as_str().to_ascii_lowercase())
        .as_deref()
    {
        Some("k") => 1_000.0,
        Some("m") => 1_000_000.0,
        Some("b") => 1_000_000_000.0,
        _ => 1.0,
    };
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let count = (value * multiplier).round() as u64;
    Some(count)
}
