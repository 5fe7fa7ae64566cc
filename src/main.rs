//! UI Backend Proxy Server
//!
//! Reverse proxy in front of a web UI upstream with credential injection and
//! classified error responses

use anyhow::{Context, Result};
use tracing::{info, warn};
use uiproxy::config::settings::LoggingConfig;
use uiproxy::{create_router, version_info, RoutingConfig, Settings};

#[tokio::main]
async fn main() -> Result<()> {
    // Load and validate settings from environment (.env supported)
    let settings = Settings::new().context("Failed to load server settings")?;

    init_logging(&settings.logging)?;
    info!("{}", version_info());

    // Routing prefixes come from the JSON file when present
    let routing = RoutingConfig::load_default().context("Failed to load routing configuration")?;
    info!(
        "📁 Routing loaded: {} excluded, {} proxied prefixes",
        routing.excluded_prefixes.len(),
        routing.proxied_prefixes.len()
    );

    if !settings.has_configured_credential() {
        warn!(
            "{} is not set; proxied requests will be rejected until it is configured",
            settings.credential.env_var
        );
    }

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let upstream = settings.upstream.base_url.clone();

    // Create router
    let app = create_router(settings, routing)?;

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("🚀 UI proxy server started!");
    info!("📝 Health check: http://{}/health", addr);
    info!("🔄 Proxying http://{}/ui/ -> {}", addr, upstream);

    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to start server: {}", e))?;

    Ok(())
}

/// Initialize logging system
///
/// RUST_LOG takes precedence over the configured level
fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.level));

    let subscriber: Box<dyn tracing::Subscriber + Send + Sync> = if config.format == "json" {
        // JSON format logs (production environment)
        Box::new(
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .finish(),
        )
    } else {
        // Human readable format (development environment)
        Box::new(
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .finish(),
        )
    };

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!("Logging system initialized");
    Ok(())
}
