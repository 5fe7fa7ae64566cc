//! Upstream credential lookup
//!
//! The secret itself is owned by an external collaborator; the proxy only asks
//! for it before each forward.

use std::fmt::Debug;

/// Resolves the single secret injected into forwarded requests
pub trait CredentialSource: Send + Sync + Debug {
    /// Current secret, `None` when not configured
    fn resolve(&self) -> Option<String>;
}

/// Reads an environment variable on every call, falling back to a value
/// configured at startup
#[derive(Debug, Clone)]
pub struct EnvCredentialSource {
    var: String,
    fallback: Option<String>,
}

impl EnvCredentialSource {
    pub fn new(var: impl Into<String>, fallback: Option<String>) -> Self {
        Self {
            var: var.into(),
            fallback: fallback.filter(|k| !k.is_empty()),
        }
    }
}

impl CredentialSource for EnvCredentialSource {
    fn resolve(&self) -> Option<String> {
        std::env::var(&self.var)
            .ok()
            .filter(|k| !k.is_empty())
            .or_else(|| self.fallback.clone())
    }
}

/// Fixed secret, for embedding and tests
#[derive(Debug, Clone, Default)]
pub struct StaticCredentialSource(Option<String>);

impl StaticCredentialSource {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(Some(secret.into()).filter(|k| !k.is_empty()))
    }

    pub fn none() -> Self {
        Self(None)
    }
}

impl CredentialSource for StaticCredentialSource {
    fn resolve(&self) -> Option<String> {
        self.0.clone()
    }
}
