//! Proxy configuration handlers
//!
//! Read and update the upstream base URL at runtime. An update applies to
//! forwards issued after it; forwards in flight keep the URL they started with.

use crate::config::target::normalize_base_url;
use crate::handlers::AppState;
use crate::utils::error::{AppError, AppResult};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// GET /proxy/config response
#[derive(Debug, Serialize, Deserialize)]
pub struct ProxyConfigResponse {
    pub upstream_url: String,
    pub credential_configured: bool,
    pub proxy_enabled: bool,
}

/// POST /proxy/config body
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ProxyConfigUpdate {
    #[serde(default)]
    pub upstream_url: Option<String>,
}

/// POST /proxy/config response
#[derive(Debug, Serialize, Deserialize)]
pub struct ProxyConfigUpdated {
    pub message: String,
    pub upstream_url: String,
}

/// GET /proxy/config
pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<ProxyConfigResponse> {
    Json(ProxyConfigResponse {
        upstream_url: state.target.current().to_string(),
        credential_configured: state.credentials.resolve().is_some(),
        proxy_enabled: true,
    })
}

/// POST /proxy/config
pub async fn update_config(
    State(state): State<Arc<AppState>>,
    Json(update): Json<ProxyConfigUpdate>,
) -> AppResult<Json<ProxyConfigUpdated>> {
    let upstream_url = match update.upstream_url {
        Some(url) => {
            validate_upstream_url(&url)?;
            state.target.update(&url).to_string()
        }
        None => state.target.current().to_string(),
    };

    Ok(Json(ProxyConfigUpdated {
        message: "Configuration updated".to_string(),
        upstream_url,
    }))
}

fn validate_upstream_url(url: &str) -> AppResult<()> {
    let normalized = normalize_base_url(url);
    let rest = normalized
        .strip_prefix("http://")
        .or_else(|| normalized.strip_prefix("https://"));

    match rest {
        Some(host) if !host.is_empty() && !host.contains(char::is_whitespace) => Ok(()),
        _ => Err(AppError::Validation(format!(
            "Invalid upstream URL '{}', expected http(s)://host[:port][/path]",
            url
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_upstream_url() {
        assert!(validate_upstream_url("http://127.0.0.1:8081").is_ok());
        assert!(validate_upstream_url("https://ui.example.com/base/").is_ok());

        assert!(validate_upstream_url("").is_err());
        assert!(validate_upstream_url("ftp://ui").is_err());
        assert!(validate_upstream_url("http://").is_err());
        assert!(validate_upstream_url("http://bad host").is_err());
    }
}
