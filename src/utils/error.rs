//! Error handling module
//!
//! Defines error types and handling logic used in the project

use crate::models::error_info::ErrorPayload;
use crate::services::presenter::present;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// No upstream credential available
    #[error("Upstream credential not configured. Please set the {0} environment variable.")]
    MissingCredential(String),

    /// Request validation failed
    #[error("Request validation failed: {0}")]
    Validation(String),

    /// Upstream could not be reached; carries the classified diagnostic
    #[error("Upstream gateway failure: {}", .0.original_error)]
    Gateway(Box<ErrorPayload>),

    /// Internal server error
    #[error("Proxy error: {0}")]
    Internal(String),

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Payload too large
    #[error("Payload too large")]
    PayloadTooLarge,
}

/// Error response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error type
    #[serde(rename = "type")]
    pub error_type: String,
    /// Error message
    pub message: String,
    /// Request ID (for tracking)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Envelope for classified upstream failures on request/response surfaces
#[derive(Debug, Serialize, Deserialize)]
pub struct GatewayErrorResponse {
    pub status: bool,
    pub error_info: ErrorPayload,
    pub message: String,
}

impl AppError {
    /// Classify a transport-level failure into a gateway error
    pub fn gateway(error_text: impl AsRef<str>) -> Self {
        let payload = present(error_text.as_ref(), Some(StatusCode::BAD_GATEWAY.as_u16()));
        AppError::Gateway(Box::new(payload))
    }

    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingCredential(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Gateway(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error type string
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::MissingCredential(_) => "credential_error",
            AppError::Validation(_) => "invalid_request_error",
            AppError::NotFound(_) => "not_found_error",
            AppError::PayloadTooLarge => "invalid_request_error",
            AppError::Gateway(_) => "gateway_error",
            AppError::Internal(_) => "api_error",
        }
    }

    /// Whether detailed error information should be logged
    pub fn should_log_details(&self) -> bool {
        !matches!(self, AppError::NotFound(_) | AppError::MissingCredential(_))
    }

    /// Convert to the generic error response format
    pub fn to_error_response(&self) -> ErrorResponse {
        ErrorResponse {
            error_type: self.error_type().to_string(),
            message: self.to_string(),
            request_id: None,
        }
    }
}

/// Implement IntoResponse trait to allow errors to be returned directly as HTTP responses
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Log error
        if self.should_log_details() {
            tracing::error!("Application error: {} - Status code: {}", self, status);
        } else {
            tracing::warn!("Client error: {} - Status code: {}", self.error_type(), status);
        }

        match self {
            AppError::Gateway(payload) => {
                let body = GatewayErrorResponse {
                    status: false,
                    message: payload.title.clone(),
                    error_info: *payload,
                };
                (status, Json(body)).into_response()
            }
            other => (status, Json(other.to_error_response())).into_response(),
        }
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Describe a reqwest failure for classification
///
/// The full source chain is kept (it carries e.g. "Connection refused"), and
/// timeouts and connect failures get a prefix the classifier recognizes.
pub fn describe_transport_error(error: &reqwest::Error) -> String {
    let mut chain = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        chain.push_str(": ");
        chain.push_str(&cause.to_string());
        source = cause.source();
    }

    if error.is_timeout() {
        format!("Request timeout: {}", chain)
    } else if error.is_connect() {
        format!("Connection error: {}", chain)
    } else {
        chain
    }
}
