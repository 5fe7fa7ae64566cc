//! Outbound request construction
//!
//! URL resolution, header copying and credential injection shared by the
//! buffered and streaming forwarders.

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderValue, Method, Response, StatusCode};
use std::sync::Arc;
use tracing::debug;

use crate::utils::error::{AppError, AppResult};

/// Body field receiving the injected credential
pub const API_KEY_FIELD: &str = "api_key";

/// Read the inbound body up to `limit` bytes
///
/// Oversized bodies map to 413, any other read failure to 400.
pub async fn read_body(body: Body, limit: usize) -> AppResult<Bytes> {
    axum::body::to_bytes(body, limit).await.map_err(|e| {
        if exceeds_length_limit(&e) {
            AppError::PayloadTooLarge
        } else {
            AppError::Validation(format!("Failed to read request body: {}", e))
        }
    })
}

fn exceeds_length_limit(err: &axum::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = source {
        if e.to_string().contains("length limit exceeded") {
            return true;
        }
        source = e.source();
    }
    false
}

/// Upstream base URL plus the requested path
#[derive(Debug, Clone)]
pub struct ForwardTarget {
    base_url: Arc<String>,
    path: String,
}

impl ForwardTarget {
    /// `base_url` must already be normalized (see `ProxyTarget`)
    pub fn new(base_url: Arc<String>, path: &str) -> Self {
        Self {
            base_url,
            path: path.trim_start_matches('/').to_string(),
        }
    }

    /// Fully-qualified URL with exactly one separating slash
    pub fn url(&self) -> String {
        format!("{}/{}", self.base_url, self.path)
    }

    /// URL carrying the original query string, if any
    pub fn url_with_query(&self, query: Option<&str>) -> String {
        match query {
            Some(q) if !q.is_empty() => format!("{}?{}", self.url(), q),
            _ => self.url(),
        }
    }
}

/// Request issued to the upstream, built fresh for every forward
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl OutboundRequest {
    /// Build from the inbound parts; `host` is dropped from the headers
    pub fn new(
        method: Method,
        target: &ForwardTarget,
        query: Option<&str>,
        inbound_headers: &HeaderMap,
        body: Bytes,
    ) -> Self {
        Self {
            method,
            url: target.url_with_query(query),
            headers: outbound_headers(inbound_headers),
            body,
        }
    }

    /// Set `Authorization: Bearer <secret>`, replacing any existing value
    pub fn inject_authorization(&mut self, secret: &str) -> AppResult<()> {
        let value = HeaderValue::from_str(&format!("Bearer {}", secret))
            .map_err(|_| AppError::Internal("configured credential is not a valid header value".to_string()))?;
        self.headers.insert(header::AUTHORIZATION, value);
        Ok(())
    }

    /// Header and JSON body injection, for bodies that may be rewritten
    pub fn inject_credential(&mut self, secret: &str) -> AppResult<()> {
        self.inject_authorization(secret)?;
        self.inject_into_json_body(secret);
        Ok(())
    }

    /// Add `api_key` to a JSON object body and recompute `content-length`
    ///
    /// Bodies that are not declared JSON or are not a JSON object are left
    /// untouched.
    pub fn inject_into_json_body(&mut self, secret: &str) {
        if self.body.is_empty() || !declares_json(&self.headers) {
            return;
        }

        let mut object = match serde_json::from_slice::<serde_json::Value>(&self.body) {
            Ok(serde_json::Value::Object(object)) => object,
            Ok(_) => {
                debug!("JSON body is not an object, skipping body credential injection");
                return;
            }
            Err(e) => {
                debug!("Body declared as JSON does not parse ({}), skipping body credential injection", e);
                return;
            }
        };

        object.insert(
            API_KEY_FIELD.to_string(),
            serde_json::Value::String(secret.to_string()),
        );

        match serde_json::to_vec(&object) {
            Ok(rewritten) => {
                self.headers
                    .insert(header::CONTENT_LENGTH, HeaderValue::from(rewritten.len()));
                self.body = Bytes::from(rewritten);
            }
            Err(e) => debug!("Failed to re-serialize JSON body: {}", e),
        }
    }
}

/// Copy inbound headers, dropping `host` and `accept-encoding`
///
/// The client's `accept-encoding` is replaced by the one the HTTP client
/// advertises itself, so the upstream only picks a codec that is decoded
/// before the body is relayed. Keys are case-insensitive and a repeated key
/// keeps its last value.
pub fn outbound_headers(inbound: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(inbound.len());
    for (name, value) in inbound.iter() {
        if *name == header::HOST || *name == header::ACCEPT_ENCODING {
            continue;
        }
        headers.insert(name.clone(), value.clone());
    }
    headers
}

/// Upstream response headers minus the ones the proxy re-frames itself
pub fn reframed_response_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut headers = upstream.clone();
    headers.remove(header::CONTENT_ENCODING);
    headers.remove(header::TRANSFER_ENCODING);
    headers
}

/// Rebuild a client response from upstream status, headers and a body
pub fn relay_response(status: StatusCode, upstream_headers: &HeaderMap, body: Body) -> Response<Body> {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = reframed_response_headers(upstream_headers);
    response
}

/// Whether `content-type` declares a JSON body
fn declares_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| {
            let essence = ct.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
            essence == "application/json" || essence.ends_with("+json")
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderName;

    fn target(path: &str) -> ForwardTarget {
        ForwardTarget::new(Arc::new("http://ui:8081".to_string()), path)
    }

    fn json_request(body: &str) -> OutboundRequest {
        let mut inbound = HeaderMap::new();
        inbound.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        inbound.insert(header::CONTENT_LENGTH, HeaderValue::from(body.len()));
        OutboundRequest::new(
            Method::POST,
            &target("chat"),
            None,
            &inbound,
            Bytes::from(body.to_string()),
        )
    }

    #[test]
    fn test_url_has_single_separator() {
        assert_eq!(target("/api/sessions").url(), "http://ui:8081/api/sessions");
        assert_eq!(target("//x").url(), "http://ui:8081/x");
        assert_eq!(target("").url(), "http://ui:8081/");
        assert_eq!(
            target("chat").url_with_query(Some("stream=true&a=1")),
            "http://ui:8081/chat?stream=true&a=1"
        );
        assert_eq!(target("chat").url_with_query(Some("")), "http://ui:8081/chat");
    }

    #[test]
    fn test_host_header_dropped_in_any_casing() {
        let mut inbound = HeaderMap::new();
        inbound.insert(
            HeaderName::from_bytes(b"Host").unwrap(),
            HeaderValue::from_static("proxy.local"),
        );
        inbound.insert(
            HeaderName::from_bytes(b"X-Trace").unwrap(),
            HeaderValue::from_static("1"),
        );

        let headers = outbound_headers(&inbound);
        assert!(headers.get("host").is_none());
        assert!(headers.get("HOST").is_none());
        assert_eq!(headers.get("x-trace").unwrap(), "1");
    }

    #[test]
    fn test_client_accept_encoding_not_forwarded() {
        let mut inbound = HeaderMap::new();
        inbound.insert(
            header::ACCEPT_ENCODING,
            HeaderValue::from_static("gzip, deflate, br, zstd"),
        );
        inbound.insert(header::ACCEPT, HeaderValue::from_static("text/html"));

        let headers = outbound_headers(&inbound);
        assert!(headers.get(header::ACCEPT_ENCODING).is_none());
        assert_eq!(headers.get(header::ACCEPT).unwrap(), "text/html");
    }

    #[test]
    fn test_duplicate_header_keeps_last_value() {
        let mut inbound = HeaderMap::new();
        inbound.append("x-tag", HeaderValue::from_static("first"));
        inbound.append("x-tag", HeaderValue::from_static("second"));

        let headers = outbound_headers(&inbound);
        let values: Vec<_> = headers.get_all("x-tag").iter().collect();
        assert_eq!(values, vec!["second"]);
    }

    #[test]
    fn test_json_object_body_gets_api_key() {
        let mut request = json_request(r#"{"x":1}"#);
        request.inject_credential("abc").unwrap();

        let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
        assert_eq!(body, serde_json::json!({"x": 1, "api_key": "abc"}));
        assert_eq!(
            request.headers.get(header::CONTENT_LENGTH).unwrap(),
            &HeaderValue::from(request.body.len())
        );
        assert_eq!(request.headers.get(header::AUTHORIZATION).unwrap(), "Bearer abc");
    }

    #[test]
    fn test_existing_authorization_and_api_key_overwritten() {
        let mut request = json_request(r#"{"api_key":"old"}"#);
        request
            .headers
            .insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer old"));

        request.inject_credential("new").unwrap();

        let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
        assert_eq!(body["api_key"], "new");
        assert_eq!(request.headers.get(header::AUTHORIZATION).unwrap(), "Bearer new");
    }

    #[test]
    fn test_non_object_bodies_untouched() {
        for body in [r#"[1,2,3]"#, "not json at all", r#""string""#] {
            let mut request = json_request(body);
            request.inject_credential("abc").unwrap();

            assert_eq!(request.body, Bytes::from(body.to_string()));
            assert_eq!(request.headers.get(header::AUTHORIZATION).unwrap(), "Bearer abc");
        }
    }

    #[test]
    fn test_non_json_content_type_untouched() {
        let mut inbound = HeaderMap::new();
        inbound.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        let mut request = OutboundRequest::new(
            Method::POST,
            &target("chat"),
            None,
            &inbound,
            Bytes::from_static(br#"{"x":1}"#),
        );

        request.inject_credential("abc").unwrap();
        assert_eq!(request.body, Bytes::from_static(br#"{"x":1}"#));
    }

    #[test]
    fn test_json_content_type_with_charset() {
        let mut inbound = HeaderMap::new();
        inbound.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("Application/JSON; charset=utf-8"),
        );
        assert!(declares_json(&inbound));
    }

    #[test]
    fn test_reframing_headers_stripped() {
        let mut upstream = HeaderMap::new();
        upstream.insert(header::CONTENT_ENCODING, HeaderValue::from_static("gzip"));
        upstream.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        upstream.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/html"));

        let headers = reframed_response_headers(&upstream);
        assert!(headers.get(header::CONTENT_ENCODING).is_none());
        assert!(headers.get(header::TRANSFER_ENCODING).is_none());
        assert_eq!(headers.get(header::CONTENT_TYPE).unwrap(), "text/html");
    }
}
