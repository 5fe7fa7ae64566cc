//! Logging utilities
//!
//! Shared helpers that keep secrets and oversized values out of the logs

use axum::http::HeaderMap;

/// Headers whose values are never logged
pub const REDACTED_HEADERS: &[&str] = &[
    "authorization",
    "proxy-authorization",
    "cookie",
    "set-cookie",
    "x-api-key",
];

/// Header values longer than this are truncated in logs
const MAX_LOGGED_VALUE_LEN: usize = 200;

/// Truncate a string with a note about original length
pub fn truncate_content(s: &str, max_len: usize) -> String {
    let total = s.chars().count();
    if total > max_len {
        let head: String = s.chars().take(max_len).collect();
        format!("{}... ({} chars truncated)", head, total - max_len)
    } else {
        s.to_string()
    }
}

/// Create a loggable view of a header set with secrets redacted
pub fn create_header_log_summary(headers: &HeaderMap) -> serde_json::Value {
    let mut summary = serde_json::Map::new();

    for (name, value) in headers.iter() {
        let logged = if REDACTED_HEADERS.contains(&name.as_str()) {
            "[redacted]".to_string()
        } else {
            match value.to_str() {
                Ok(text) => truncate_content(text, MAX_LOGGED_VALUE_LEN),
                Err(_) => format!("[{} bytes binary]", value.len()),
            }
        };
        summary.insert(name.as_str().to_string(), serde_json::Value::String(logged));
    }

    serde_json::Value::Object(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secrets_are_redacted() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", "Bearer sk-secret".parse().unwrap());
        headers.insert("cookie", "session=abc".parse().unwrap());
        headers.insert("accept", "text/event-stream".parse().unwrap());

        let summary = create_header_log_summary(&headers);
        let text = summary.to_string();

        assert!(!text.contains("sk-secret"));
        assert!(!text.contains("session=abc"));
        assert_eq!(summary["accept"], "text/event-stream");
    }

    #[test]
    fn test_truncate_content() {
        assert_eq!(truncate_content("short", 10), "short");
        assert_eq!(truncate_content("abcdef", 3), "abc... (3 chars truncated)");
    }
}
