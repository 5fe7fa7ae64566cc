//! Buffered request forwarder
//!
//! Reads the whole inbound body, injects the credential into headers and JSON
//! body, issues one upstream call with a fixed timeout and relays the buffered
//! response. Transport failures become classified gateway errors; upstream
//! error statuses are passed through untouched. There are no retries.

use crate::config::{ProxyTarget, Settings};
use crate::services::outbound::{read_body, relay_response, ForwardTarget, OutboundRequest};
use crate::utils::error::{describe_transport_error, AppError, AppResult};
use crate::utils::logging::create_header_log_summary;
use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::Request;
use axum::http::Response;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

pub(crate) const USER_AGENT: &str = concat!("uiproxy/", env!("CARGO_PKG_VERSION"));

/// Liveness of the upstream root
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamHealth {
    /// "accessible" or "inaccessible"
    pub upstream_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub url: String,
}

impl UpstreamHealth {
    pub fn is_accessible(&self) -> bool {
        self.upstream_status == "accessible"
    }
}

/// Buffered forwarder
#[derive(Debug, Clone)]
pub struct RequestForwarder {
    client: Client,
    target: Arc<ProxyTarget>,
    max_body_size: usize,
}

impl RequestForwarder {
    /// Create a forwarder reading its base URL from `target`
    pub fn new(settings: &Settings, target: Arc<ProxyTarget>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.upstream.timeout))
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            target,
            max_body_size: settings.request.max_request_size,
        })
    }

    /// Forward `request` to `target_path` on the current upstream
    pub async fn forward(
        &self,
        request: Request,
        target_path: &str,
        credential: Option<&str>,
    ) -> AppResult<Response<Body>> {
        let target = ForwardTarget::new(self.target.current(), target_path);
        let (parts, body) = request.into_parts();

        let body = read_body(body, self.max_body_size).await?;

        let mut outbound =
            OutboundRequest::new(parts.method, &target, parts.uri.query(), &parts.headers, body);
        if let Some(secret) = credential {
            outbound.inject_credential(secret)?;
        }

        debug!(
            "Forwarding {} {} ({} bytes) headers={}",
            outbound.method,
            outbound.url,
            outbound.body.len(),
            create_header_log_summary(&outbound.headers)
        );

        let url = outbound.url.clone();
        let response = self
            .client
            .request(outbound.method, &outbound.url)
            .headers(outbound.headers)
            .body(outbound.body)
            .send()
            .await
            .map_err(|e| transport_failure(&url, &e))?;

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| transport_failure(&url, &e))?;

        if status.is_client_error() || status.is_server_error() {
            warn!("Upstream returned {} for {}, passing through", status, url);
        } else {
            debug!("Upstream returned {} for {} ({} bytes)", status, url, bytes.len());
        }

        Ok(relay_response(status, &headers, Body::from(bytes)))
    }

    /// Probe the upstream root
    pub async fn health_check(&self) -> UpstreamHealth {
        let url = format!("{}/", self.target.current());
        debug!("Probing upstream at {}", url);

        match self.client.get(&url).send().await {
            Ok(response) => UpstreamHealth {
                upstream_status: "accessible".to_string(),
                status_code: Some(response.status().as_u16()),
                error: None,
                url,
            },
            Err(e) => {
                warn!("Upstream health check failed: {}", e);
                UpstreamHealth {
                    upstream_status: "inaccessible".to_string(),
                    status_code: None,
                    error: Some(describe_transport_error(&e)),
                    url,
                }
            }
        }
    }
}

/// Convert a transport-level failure into a classified gateway error
pub(crate) fn transport_failure(url: &str, error: &reqwest::Error) -> AppError {
    let description = describe_transport_error(error);
    error!("Request error when forwarding to {}: {}", url, description);
    AppError::gateway(format!("Failed to reach upstream: {}", description))
}
