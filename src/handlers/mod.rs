//! HTTP handlers module
//!
//! Contains all HTTP endpoint handling logic

pub mod admin;
pub mod health;
pub mod proxy;

use crate::config::{CredentialSource, EnvCredentialSource, ProxyTarget, RoutingConfig, Settings};
use crate::middleware::logging::request_logging_middleware;
use crate::services::{RequestForwarder, StreamForwarder};
use anyhow::Result;
use axum::{
    http::HeaderValue,
    middleware,
    routing::{any, get},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use tracing::warn;

/// Application state
#[derive(Debug, Clone)]
pub struct AppState {
    pub settings: Settings,
    pub routing: RoutingConfig,
    pub target: Arc<ProxyTarget>,
    pub credentials: Arc<dyn CredentialSource>,
    pub forwarder: RequestForwarder,
    pub stream_forwarder: StreamForwarder,
}

impl AppState {
    pub fn new(
        settings: Settings,
        routing: RoutingConfig,
        credentials: Arc<dyn CredentialSource>,
    ) -> Result<Self> {
        health::mark_started();
        let target = Arc::new(ProxyTarget::new(&settings.upstream.base_url));
        let forwarder = RequestForwarder::new(&settings, target.clone())?;
        let stream_forwarder = StreamForwarder::new(&settings, target.clone())?;

        Ok(Self {
            settings,
            routing,
            target,
            credentials,
            forwarder,
            stream_forwarder,
        })
    }
}

/// Create application router
///
/// The credential is read from the configured environment variable on every
/// forward, falling back to the key loaded at startup.
pub fn create_router(settings: Settings, routing: RoutingConfig) -> Result<Router> {
    let credentials = Arc::new(EnvCredentialSource::new(
        settings.credential.env_var.clone(),
        settings.credential.api_key.clone(),
    ));
    let state = AppState::new(settings, routing, credentials)?;
    Ok(build_router(Arc::new(state)))
}

/// Build the router over an existing state
pub fn build_router(state: Arc<AppState>) -> Router {
    let middleware_stack = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_logging_middleware))
        // Innermost, so the logging middleware still sees a plain `Body`
        .layer(RequestBodyLimitLayer::new(
            state.settings.request.max_request_size,
        ));

    let router = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/live", get(health::liveness_check))
        .route("/proxy/health", get(health::proxy_health))
        .route(
            "/proxy/config",
            get(admin::get_config).post(admin::update_config),
        )
        .route("/ui", any(proxy::proxy_ui_root))
        .route("/ui/", any(proxy::proxy_ui_root))
        .route("/ui/*path", any(proxy::proxy_ui))
        .fallback(proxy::catch_all)
        .with_state(state.clone())
        .layer(middleware_stack);

    if state.settings.security.cors_enabled {
        router.layer(cors_layer(&state.settings.security.allowed_origins))
    } else {
        router
    }
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if allowed_origins.is_empty() || allowed_origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    layer.allow_origin(origins)
}
