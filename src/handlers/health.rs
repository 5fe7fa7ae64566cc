//! Health check handlers
//!
//! Provides application health status check endpoints

use crate::handlers::AppState;
use crate::services::UpstreamHealth;
use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};
use tracing::debug;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service name
    pub service: String,
    /// Version information
    pub version: String,
    /// Timestamp
    pub timestamp: String,
    /// Uptime in seconds
    pub uptime_seconds: u64,
}

/// Proxy health response, including the upstream check
#[derive(Debug, Serialize, Deserialize)]
pub struct ProxyHealthResponse {
    pub proxy_status: String,
    pub credential_configured: bool,
    #[serde(flatten)]
    pub upstream: UpstreamHealth,
}

/// Basic health check
///
/// GET /health
pub async fn health_check(State(_state): State<Arc<AppState>>) -> Json<HealthResponse> {
    debug!("Executing health check");
    Json(health_response("healthy"))
}

/// Liveness check
///
/// GET /health/live
/// Only confirms the process is serving; does not touch the upstream
pub async fn liveness_check(State(_state): State<Arc<AppState>>) -> Json<HealthResponse> {
    debug!("Executing liveness check");
    Json(health_response("alive"))
}

/// Proxy and upstream health
///
/// GET /proxy/health
pub async fn proxy_health(State(state): State<Arc<AppState>>) -> Json<ProxyHealthResponse> {
    debug!("Executing proxy health check");

    let upstream = state.forwarder.health_check().await;

    Json(ProxyHealthResponse {
        proxy_status: "running".to_string(),
        credential_configured: state.credentials.resolve().is_some(),
        upstream,
    })
}

fn health_response(status: &str) -> HealthResponse {
    HealthResponse {
        status: status.to_string(),
        service: crate::NAME.to_string(),
        version: crate::VERSION.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        uptime_seconds: get_uptime_seconds(),
    }
}

static START_TIME: OnceLock<Instant> = OnceLock::new();

/// Record the process start; later calls keep the first instant
pub fn mark_started() {
    START_TIME.get_or_init(Instant::now);
}

fn uptime() -> Duration {
    START_TIME.get_or_init(Instant::now).elapsed()
}

/// Get service uptime in seconds
fn get_uptime_seconds() -> u64 {
    uptime().as_secs()
}
