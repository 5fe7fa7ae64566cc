//! Process-wide upstream target
//!
//! The base URL is read on every forward and replaced rarely through the
//! config endpoint. Readers take an `Arc` snapshot; an update swaps the whole
//! string atomically, so a reader sees either the old or the new URL and a
//! forward already in flight keeps the one it started with.

use arc_swap::ArcSwap;
use std::sync::Arc;
use tracing::info;

#[derive(Debug)]
pub struct ProxyTarget {
    base_url: ArcSwap<String>,
}

impl ProxyTarget {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: ArcSwap::from_pointee(normalize_base_url(base_url)),
        }
    }

    /// Snapshot of the current base URL
    pub fn current(&self) -> Arc<String> {
        self.base_url.load_full()
    }

    /// Replace the base URL; affects forwards issued after the swap
    pub fn update(&self, base_url: &str) -> Arc<String> {
        let normalized = Arc::new(normalize_base_url(base_url));
        let previous = self.base_url.swap(Arc::clone(&normalized));
        info!("Upstream target changed: {} -> {}", previous, normalized);
        normalized
    }
}

/// Strip trailing slashes once, at configuration time
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizes_trailing_slashes() {
        assert_eq!(normalize_base_url("http://ui:8081/"), "http://ui:8081");
        assert_eq!(normalize_base_url(" http://ui:8081// "), "http://ui:8081");
        assert_eq!(normalize_base_url("http://ui:8081/base"), "http://ui:8081/base");
    }

    #[test]
    fn test_snapshot_survives_update() {
        let target = ProxyTarget::new("http://old:1/");
        let snapshot = target.current();

        let updated = target.update("http://new:2/");

        assert_eq!(snapshot.as_str(), "http://old:1");
        assert_eq!(updated.as_str(), "http://new:2");
        assert_eq!(target.current().as_str(), "http://new:2");
    }
}
