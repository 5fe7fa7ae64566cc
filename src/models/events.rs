//! Persistent-channel event shapes
//!
//! Messages emitted to a run's channel when an upstream failure is reported

use crate::models::error_info::{ErrorKind, ErrorPayload};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a run on a persistent channel
pub type RunId = i64;

/// Structured error event consumed by error-aware clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub run_id: RunId,
    pub error_info: ErrorPayload,
    pub timestamp: DateTime<Utc>,
}

impl ApiErrorEvent {
    pub fn new(run_id: RunId, error_info: ErrorPayload) -> Self {
        Self {
            event_type: "api_error".to_string(),
            run_id,
            timestamp: error_info.timestamp,
            error_info,
        }
    }
}

/// Chat-style message rendered by every client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemMessageEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: SystemMessageData,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemMessageData {
    pub source: String,
    pub content: String,
    pub metadata: SystemMessageMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemMessageMetadata {
    pub internal: String,
    pub error_type: ErrorKind,
    pub has_solutions: bool,
}

impl SystemMessageEvent {
    pub fn from_payload(payload: &ErrorPayload) -> Self {
        Self {
            event_type: "message".to_string(),
            data: SystemMessageData {
                source: "system".to_string(),
                content: format!("{}\n\n{}", payload.title, payload.message),
                metadata: SystemMessageMetadata {
                    internal: "no".to_string(),
                    error_type: payload.error_type,
                    has_solutions: payload.has_solutions(),
                },
            },
            timestamp: payload.timestamp,
        }
    }
}

/// Generic error event, used as the last-resort fallback and by the plain handler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenericErrorEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub error: String,
    pub timestamp: DateTime<Utc>,
}

impl GenericErrorEvent {
    pub const FALLBACK_TEXT: &'static str = "An error occurred while processing your request";

    pub fn new(error: impl Into<String>) -> Self {
        Self {
            event_type: "error".to_string(),
            error: error.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn fallback() -> Self {
        Self::new(Self::FALLBACK_TEXT)
    }
}
