//! File-based routing configuration
//!
//! Loads the static path prefix lists that decide which catch-all paths are
//! forwarded upstream.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Paths reserved for the local authentication surface
pub const DEFAULT_EXCLUDED_PREFIXES: &[&str] = &[
    "api/auth",
    "login",
    "register",
    "docs",
    "openapi.json",
    "health",
];

/// Paths that belong to the upstream UI
pub const DEFAULT_PROXIED_PREFIXES: &[&str] = &["static", "assets", "_next", "chat", "conversation"];

/// Catch-all routing configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Prefixes never forwarded (checked first)
    #[serde(rename = "excludedPrefixes", default = "default_excluded")]
    pub excluded_prefixes: Vec<String>,

    /// Prefixes forwarded by the catch-all route
    #[serde(rename = "proxiedPrefixes", default = "default_proxied")]
    pub proxied_prefixes: Vec<String>,
}

fn default_excluded() -> Vec<String> {
    DEFAULT_EXCLUDED_PREFIXES.iter().map(|p| p.to_string()).collect()
}

fn default_proxied() -> Vec<String> {
    DEFAULT_PROXIED_PREFIXES.iter().map(|p| p.to_string()).collect()
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            excluded_prefixes: default_excluded(),
            proxied_prefixes: default_proxied(),
        }
    }
}

/// Outcome of matching a catch-all path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// Path is reserved and must not be forwarded
    Excluded,
    /// Path is forwarded upstream
    Proxied,
    /// Path is neither; not found
    Unmatched,
}

impl RoutingConfig {
    /// Load configuration from JSON file
    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading routing configuration from: {:?}", path);

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read routing config file: {:?}", path))?;

        let config: RoutingConfig =
            serde_json::from_str(&content).with_context(|| "Failed to parse routing config JSON")?;

        config.validate()?;

        debug!(
            "Loaded {} excluded and {} proxied prefixes",
            config.excluded_prefixes.len(),
            config.proxied_prefixes.len()
        );
        Ok(config)
    }

    /// Load configuration from default locations
    /// Searches in order:
    /// 1. ~/.config/uiproxy/routing.json
    /// 2. ./uiproxy.routing.json
    ///
    /// Falls back to the built-in prefix lists when no file exists.
    pub fn load_default() -> Result<Self> {
        if let Some(home) = dirs::home_dir() {
            let config_path = home.join(".config").join("uiproxy").join("routing.json");
            if config_path.exists() {
                return Self::load(&config_path);
            }
        }

        let local_path = Path::new("uiproxy.routing.json");
        if local_path.exists() {
            return Self::load(local_path);
        }

        debug!("No routing configuration file found, using built-in prefixes");
        Ok(Self::default())
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        for prefix in self.excluded_prefixes.iter().chain(&self.proxied_prefixes) {
            if prefix.trim().is_empty() {
                anyhow::bail!("Routing prefixes cannot be empty");
            }
            if prefix.starts_with('/') {
                anyhow::bail!("Routing prefix '{}' must not start with '/'", prefix);
            }
        }

        Ok(())
    }

    /// Decide how the catch-all route treats a path (leading slash ignored)
    pub fn decide(&self, path: &str) -> RouteDecision {
        let path = path.trim_start_matches('/');

        if self.excluded_prefixes.iter().any(|p| path.starts_with(p.as_str())) {
            RouteDecision::Excluded
        } else if self.proxied_prefixes.iter().any(|p| path.starts_with(p.as_str())) {
            RouteDecision::Proxied
        } else {
            RouteDecision::Unmatched
        }
    }
}
