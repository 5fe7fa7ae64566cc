//! Error presenter
//!
//! Builds the user-facing error payload: classification plus a fixed,
//! kind-specific list of remediation options with exactly one primary entry.

use crate::models::error_info::{ErrorKind, ErrorPayload, Solution, SolutionAction};
use crate::services::classifier::classify;
use chrono::Utc;

pub const OPENROUTER_CREDITS_URL: &str = "https://openrouter.ai/settings/credits";
pub const OPENROUTER_KEYS_URL: &str = "https://openrouter.ai/keys";
pub const OPENAI_BILLING_URL: &str = "https://platform.openai.com/account/billing";

/// Free-tier models suggested when credits run out
pub const FREE_TIER_MODELS: &[&str] = &[
    "meta-llama/llama-3.2-3b-instruct:free",
    "microsoft/phi-3-mini-128k-instruct:free",
];

/// Build the full payload for an error text
pub fn present(error_text: &str, status_code: Option<u16>) -> ErrorPayload {
    let classification = classify(error_text, status_code);

    ErrorPayload {
        error_type: classification.kind,
        title: classification.title,
        message: classification.message,
        solutions: solutions_for(classification.kind),
        original_error: error_text.to_string(),
        status_code,
        timestamp: Utc::now(),
    }
}

/// Remediation options for a kind, primary first
pub fn solutions_for(kind: ErrorKind) -> Vec<Solution> {
    match kind {
        ErrorKind::InsufficientCredits => vec![
            Solution::new(
                "💳 为OpenRouter账户充值",
                "访问OpenRouter设置页面为账户充值",
                SolutionAction::OpenUrl,
            )
            .with_url(OPENROUTER_CREDITS_URL)
            .primary(),
            Solution::new(
                "🔑 使用自己的API密钥",
                "配置您自己的OpenAI或其他API密钥",
                SolutionAction::OpenSettings,
            ),
            Solution::new(
                "🆓 尝试其他免费模型",
                "切换到其他可用的免费模型",
                SolutionAction::SuggestModels,
            )
            .with_models(FREE_TIER_MODELS),
        ],
        ErrorKind::InvalidApiKey => vec![
            Solution::new(
                "🔧 检查API密钥",
                "确认API密钥是否正确复制",
                SolutionAction::OpenSettings,
            )
            .primary(),
            Solution::new(
                "🔄 重新生成API密钥",
                "在API提供商网站重新生成密钥",
                SolutionAction::OpenUrl,
            )
            .with_url(OPENROUTER_KEYS_URL),
        ],
        ErrorKind::QuotaExceeded => vec![
            Solution::new(
                "💰 检查账户余额",
                "确认账户是否有足够余额",
                SolutionAction::OpenUrl,
            )
            .with_url(OPENAI_BILLING_URL)
            .primary(),
            Solution::new(
                "⏳ 等待配额重置",
                "等待API配额在下个周期重置",
                SolutionAction::Wait,
            ),
        ],
        ErrorKind::RateLimit => vec![
            Solution::new("⏱️ 稍后重试", "等待几分钟后再次尝试", SolutionAction::RetryLater)
                .primary(),
            Solution::new(
                "📈 升级API计划",
                "升级到更高级别的API计划",
                SolutionAction::OpenUrl,
            )
            .with_url(OPENROUTER_CREDITS_URL),
        ],
        ErrorKind::ModelNotFound
        | ErrorKind::NetworkError
        | ErrorKind::Timeout
        | ErrorKind::Unknown => vec![
            Solution::new("🔄 重试请求", "稍后重新尝试您的请求", SolutionAction::Retry).primary(),
            Solution::new(
                "⚙️ 检查设置",
                "检查您的API配置设置",
                SolutionAction::OpenSettings,
            ),
        ],
    }
}
