//! Proxy handlers
//!
//! Forwards UI traffic to the upstream. `/ui/*` is always forwarded; the
//! catch-all route only forwards allowlisted prefixes and never touches the
//! reserved authentication paths.

use crate::config::RouteDecision;
use crate::handlers::AppState;
use crate::utils::error::{AppError, AppResult};
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap, Response},
};
use std::sync::Arc;
use tracing::debug;

/// Media type that selects the streaming path
const EVENT_STREAM: &str = "text/event-stream";

/// Query substring that selects the streaming path
const STREAM_QUERY_MARKER: &str = "stream";

/// Handle `/ui` and `/ui/`
pub async fn proxy_ui_root(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> AppResult<Response<Body>> {
    dispatch(&state, request, "").await
}

/// Handle `/ui/*path`
///
/// The path is taken from the raw URI so percent-escapes reach the upstream
/// as the client sent them.
pub async fn proxy_ui(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> AppResult<Response<Body>> {
    let path = ui_subpath(request.uri().path()).to_string();
    dispatch(&state, request, &path).await
}

/// Part of a `/ui/...` path after the prefix, still percent-encoded
fn ui_subpath(path: &str) -> &str {
    path.strip_prefix("/ui/").unwrap_or_default()
}

/// Fallback for paths not matched by any other route
pub async fn catch_all(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> AppResult<Response<Body>> {
    let path = request.uri().path().trim_start_matches('/').to_string();

    match state.routing.decide(&path) {
        RouteDecision::Proxied => dispatch(&state, request, &path).await,
        RouteDecision::Excluded => {
            debug!("Path {} is reserved, not forwarding", path);
            Err(AppError::NotFound("Path not found".to_string()))
        }
        RouteDecision::Unmatched => Err(AppError::NotFound("Path not found".to_string())),
    }
}

/// Resolve the credential and pick the buffered or streaming forwarder
async fn dispatch(state: &AppState, request: Request, path: &str) -> AppResult<Response<Body>> {
    // Checked before any network I/O
    let credential = state
        .credentials
        .resolve()
        .ok_or_else(|| AppError::MissingCredential(state.settings.credential.env_var.clone()))?;

    if wants_streaming(request.headers(), request.uri().query()) {
        debug!("Streaming forward for /{}", path);
        state
            .stream_forwarder
            .forward(request, path, Some(credential.as_str()))
            .await
    } else {
        debug!("Buffered forward for /{}", path);
        state.forwarder.forward(request, path, Some(credential.as_str())).await
    }
}

/// Streaming when the client accepts an event stream or the query asks for one
pub fn wants_streaming(headers: &HeaderMap, query: Option<&str>) -> bool {
    let accepts_event_stream = headers
        .get_all(header::ACCEPT)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.to_ascii_lowercase().contains(EVENT_STREAM));

    accepts_event_stream || query.map_or(false, |q| q.contains(STREAM_QUERY_MARKER))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_wants_streaming() {
        let mut headers = HeaderMap::new();
        assert!(!wants_streaming(&headers, None));
        assert!(!wants_streaming(&headers, Some("page=2")));
        assert!(wants_streaming(&headers, Some("stream=true")));

        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/json, Text/Event-Stream"),
        );
        assert!(wants_streaming(&headers, None));
    }

    #[test]
    fn test_ui_subpath_keeps_escapes() {
        assert_eq!(ui_subpath("/ui/a%3Fb=1"), "a%3Fb=1");
        assert_eq!(ui_subpath("/ui/api/sessions"), "api/sessions");
        assert_eq!(ui_subpath("/other"), "");
    }
}
