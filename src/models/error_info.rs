//! Upstream error data model
//!
//! Classification results and the user-facing payload built from them

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of upstream error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InsufficientCredits,
    InvalidApiKey,
    RateLimit,
    ModelNotFound,
    QuotaExceeded,
    NetworkError,
    Timeout,
    Unknown,
}

impl ErrorKind {
    /// Wire name of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InsufficientCredits => "insufficient_credits",
            ErrorKind::InvalidApiKey => "invalid_api_key",
            ErrorKind::RateLimit => "rate_limit",
            ErrorKind::ModelNotFound => "model_not_found",
            ErrorKind::QuotaExceeded => "quota_exceeded",
            ErrorKind::NetworkError => "network_error",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Unknown => "unknown",
        }
    }

    /// Fixed user-facing title
    pub fn title(&self) -> &'static str {
        match self {
            ErrorKind::InsufficientCredits => "🚫 API余额不足",
            ErrorKind::QuotaExceeded => "🚫 API配额已用完",
            ErrorKind::InvalidApiKey => "🔑 API密钥无效",
            ErrorKind::RateLimit => "⏱️ 请求过于频繁",
            ErrorKind::ModelNotFound => "🤖 模型不可用",
            ErrorKind::NetworkError => "🌐 网络连接错误",
            ErrorKind::Timeout => "⏰ 请求超时",
            ErrorKind::Unknown => "❌ 发生未知错误",
        }
    }

    /// Fixed user-facing message
    ///
    /// `Unknown` has no fixed message; the classifier builds it from the input.
    pub fn message(&self) -> Option<&'static str> {
        match self {
            ErrorKind::InsufficientCredits => {
                Some("您的OpenRouter账户余额不足。请充值或切换到自己的API密钥。")
            }
            ErrorKind::QuotaExceeded => Some("您的API配额已用完。请检查账户余额或等待配额重置。"),
            ErrorKind::InvalidApiKey => Some("您的API密钥无效或已过期。请检查并更新您的API密钥。"),
            ErrorKind::RateLimit => {
                Some("您的请求过于频繁，请稍后再试或升级到更高级别的API计划。")
            }
            ErrorKind::ModelNotFound => Some("所选择的AI模型不存在或不可用。请选择其他模型。"),
            ErrorKind::NetworkError => Some("无法连接到API服务器。请检查网络连接或稍后重试。"),
            ErrorKind::Timeout => Some(
                "API请求超时。这可能是由于免费模型响应较慢，请稍后重试或使用付费模型。",
            ),
            ErrorKind::Unknown => None,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured classification of a raw error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub kind: ErrorKind,
    pub title: String,
    pub message: String,
}

/// Remediation action offered to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolutionAction {
    OpenUrl,
    OpenSettings,
    SuggestModels,
    Retry,
    RetryLater,
    Wait,
}

/// One remediation option
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solution {
    pub title: String,
    pub description: String,
    pub action: SolutionAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub models: Option<Vec<String>>,
    pub primary: bool,
}

impl Solution {
    pub fn new(title: &str, description: &str, action: SolutionAction) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            action,
            url: None,
            models: None,
            primary: false,
        }
    }

    pub fn with_url(mut self, url: &str) -> Self {
        self.url = Some(url.to_string());
        self
    }

    pub fn with_models(mut self, models: &[&str]) -> Self {
        self.models = Some(models.iter().map(|m| m.to_string()).collect());
        self
    }

    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }
}

/// Full user-facing error payload
///
/// Delivered as the `error_info` of HTTP gateway failures and of `api_error`
/// channel events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub error_type: ErrorKind,
    pub title: String,
    pub message: String,
    pub solutions: Vec<Solution>,
    pub original_error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    pub timestamp: DateTime<Utc>,
}

impl ErrorPayload {
    /// Primary remediation, if any
    pub fn primary_solution(&self) -> Option<&Solution> {
        self.solutions.iter().find(|s| s.primary)
    }

    pub fn has_solutions(&self) -> bool {
        !self.solutions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::InsufficientCredits).unwrap();
        assert_eq!(json, "\"insufficient_credits\"");

        let kind: ErrorKind = serde_json::from_str("\"model_not_found\"").unwrap();
        assert_eq!(kind, ErrorKind::ModelNotFound);
        assert_eq!(kind.to_string(), "model_not_found");
    }

    #[test]
    fn test_only_unknown_lacks_fixed_message() {
        assert!(ErrorKind::Unknown.message().is_none());
        assert!(ErrorKind::Timeout.message().is_some());
    }

    #[test]
    fn test_solution_skips_absent_fields() {
        let solution = Solution::new("重试", "稍后重试", SolutionAction::RetryLater).primary();
        let value = serde_json::to_value(&solution).unwrap();

        assert_eq!(value["action"], "retry_later");
        assert_eq!(value["primary"], true);
        assert!(value.get("url").is_none());
        assert!(value.get("models").is_none());
    }
}
