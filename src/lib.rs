//! UI Backend Proxy Library
//!
//! Forwards UI traffic to an upstream web UI with credential injection, and
//! turns upstream failures into classified, user-facing error payloads

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

// Re-export common types
pub use config::{RoutingConfig, Settings};
pub use handlers::{build_router, create_router, AppState};
pub use models::{ErrorKind, ErrorPayload};
pub use services::{classify, present, ErrorDeliveryMiddleware, RequestForwarder, StreamForwarder};
pub use utils::error::{AppError, AppResult};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Library description
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get version information
pub fn version_info() -> String {
    format!("{} v{} - {}", NAME, VERSION, DESCRIPTION)
}
