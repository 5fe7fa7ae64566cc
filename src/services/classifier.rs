//! Upstream error classifier
//!
//! Maps raw error text to a structured classification. Rules are evaluated in
//! order and the first match wins, so overlapping patterns resolve to the
//! earlier kind.

use crate::models::error_info::{Classification, ErrorKind};

/// Longest excerpt of the raw error kept in an `unknown` message
pub const UNKNOWN_EXCERPT_CHARS: usize = 100;

/// Marker appended to a truncated excerpt
pub const ELLIPSIS: &str = "...";

/// Ordered (kind, patterns) rules; patterns are lower-case substrings
const RULES: &[(ErrorKind, &[&str])] = &[
    (ErrorKind::InsufficientCredits, &["insufficient credits"]),
    (ErrorKind::QuotaExceeded, &["insufficient_quota", "quota exceeded"]),
    (
        ErrorKind::InvalidApiKey,
        &[
            "invalid api key",
            "unauthorized",
            "authentication failed",
            "invalid_api_key",
            "incorrect api key",
        ],
    ),
    (
        ErrorKind::RateLimit,
        &["rate limit", "too many requests", "rate_limit_exceeded"],
    ),
    (
        ErrorKind::ModelNotFound,
        &["model not found", "invalid model", "model does not exist"],
    ),
    (
        ErrorKind::NetworkError,
        &[
            "connection error",
            "network error",
            "connection timeout",
            "failed to connect",
            "connection refused",
        ],
    ),
    (ErrorKind::Timeout, &["timeout", "request timeout", "read timeout"]),
];

/// Determine the kind of an error text
///
/// The status code is carried for the payload only; matching is on text.
pub fn classify_kind(error_text: &str, _status_code: Option<u16>) -> ErrorKind {
    let lower = error_text.to_lowercase();

    RULES
        .iter()
        .find(|(_, patterns)| patterns.iter().any(|p| lower.contains(p)))
        .map(|(kind, _)| *kind)
        .unwrap_or(ErrorKind::Unknown)
}

/// Classify an error text into kind, title and message
pub fn classify(error_text: &str, status_code: Option<u16>) -> Classification {
    let kind = classify_kind(error_text, status_code);

    let message = match kind.message() {
        Some(message) => message.to_string(),
        None => excerpt(error_text),
    };

    Classification {
        kind,
        title: kind.title().to_string(),
        message,
    }
}

/// First 100 characters of the text, with an ellipsis when cut
fn excerpt(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(UNKNOWN_EXCERPT_CHARS).collect();

    if chars.next().is_some() {
        format!("{}{}", head, ELLIPSIS)
    } else {
        head
    }
}
