//! Configuration management module
//!
//! Environment settings, the routing prefix file, the swappable upstream
//! target and credential lookup.

pub mod credential;
pub mod file;
pub mod settings;
pub mod target;

pub use credential::{CredentialSource, EnvCredentialSource, StaticCredentialSource};
pub use file::{RouteDecision, RoutingConfig};
pub use settings::Settings;
pub use target::ProxyTarget;
