//! Error handling tests

use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::Value;
use uiproxy::models::ErrorKind;
use uiproxy::AppError;

async fn response_json(error: AppError) -> (StatusCode, Value) {
    let response = error.into_response();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[test]
fn test_error_types() {
    assert_eq!(
        AppError::MissingCredential("OPENAI_API_KEY".into()).error_type(),
        "credential_error"
    );
    assert_eq!(AppError::Validation("x".into()).error_type(), "invalid_request_error");
    assert_eq!(AppError::NotFound("x".into()).error_type(), "not_found_error");
    assert_eq!(AppError::PayloadTooLarge.error_type(), "invalid_request_error");
    assert_eq!(AppError::gateway("timeout").error_type(), "gateway_error");
    assert_eq!(AppError::Internal("x".into()).error_type(), "api_error");
}

#[test]
fn test_should_log_details() {
    assert!(!AppError::NotFound("x".into()).should_log_details());
    assert!(!AppError::MissingCredential("K".into()).should_log_details());
    assert!(AppError::Internal("x".into()).should_log_details());
    assert!(AppError::gateway("x").should_log_details());
}

#[tokio::test]
async fn test_missing_credential_response() {
    let (status, body) =
        response_json(AppError::MissingCredential("OPENAI_API_KEY".into())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["type"], "credential_error");
    assert_eq!(
        body["message"],
        "Upstream credential not configured. Please set the OPENAI_API_KEY environment variable."
    );
}

#[tokio::test]
async fn test_internal_error_response() {
    let (status, body) = response_json(AppError::Internal("broken pipe".into())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Proxy error: broken pipe");
    assert!(body.get("request_id").is_none());
}

#[tokio::test]
async fn test_gateway_error_response_envelope() {
    let (status, body) = response_json(AppError::gateway(
        "Failed to reach upstream: Request timeout: operation timed out",
    ))
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["status"], false);
    assert_eq!(body["message"], ErrorKind::Timeout.title());
    assert_eq!(body["error_info"]["error_type"], "timeout");
    assert_eq!(body["error_info"]["status_code"], 502);
    assert_eq!(body["error_info"]["solutions"][0]["primary"], true);
    assert_eq!(
        body["error_info"]["original_error"],
        "Failed to reach upstream: Request timeout: operation timed out"
    );
}
