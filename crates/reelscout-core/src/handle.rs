use crate::CoreError;

const MAX_HANDLE_LEN: usize = 30;

/// Normalizes a user-supplied Instagram handle.
///
/// Accepts `name`, `@name`, or a profile URL such as
/// `https://www.instagram.com/name/`. The result is lowercased and limited to
/// ASCII letters, digits, `.` and `_`, which is what the site allows; anything
/// else would end up interpolated into a navigation URL.
///
/// # Errors
///
/// Returns [`CoreError::InvalidHandle`] when the input is empty, too long, or
/// contains characters outside the allowed set.
pub fn normalize_handle(raw: &str) -> Result<String, CoreError> {
    let invalid = |reason: &str| CoreError::InvalidHandle {
        handle: raw.to_string(),
        reason: reason.to_string(),
    };

    let mut candidate = raw.trim();
    for prefix in [
        "https://www.instagram.com/",
        "http://www.instagram.com/",
        "https://instagram.com/",
        "http://instagram.com/",
    ] {
        if let Some(rest) = candidate.strip_prefix(prefix) {
            candidate = rest.split(['/', '?', '#']).next().unwrap_or_default();
            break;
        }
    }
    let candidate = candidate.trim_start_matches('@').to_ascii_lowercase();

    if candidate.is_empty() {
        return Err(invalid("handle is required"));
    }
    if candidate.len() > MAX_HANDLE_LEN {
        return Err(invalid("handle must be at most 30 characters"));
    }
    if !candidate
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'.' || b == b'_')
    {
        return Err(invalid(
            "handle may only contain letters, digits, '.' and '_'",
        ));
    }

    Ok(candidate)
}
