//! Generation errors and their user-facing summary.

use crate::producer::script::ScriptViolation;
use thiserror::Error;

/// One failed generation attempt.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("service answered {status}: {message}")]
    Status { status: u16, message: String },

    #[error("service returned no text")]
    Empty,

    #[error("generated script is invalid: {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
    InvalidOutput(Vec<ScriptViolation>),

    #[error("API key is missing; set INSTALLER_GENIE_API_KEY or pass --api-key")]
    MissingApiKey,

    #[error("no generation tiers configured")]
    NoTiers,
}

impl GenerationError {
    /// Whether retrying, on this or any later tier, cannot help.
    pub fn aborts_all_tiers(&self) -> bool {
        matches!(
            self,
            GenerationError::MissingApiKey
                | GenerationError::NoTiers
                | GenerationError::Status {
                    status: 401 | 403,
                    ..
                }
        )
    }

    fn is_rate_limit(&self) -> bool {
        match self {
            GenerationError::Status { status, message } => {
                *status == 429 || message.to_ascii_lowercase().contains("quota")
            }
            _ => false,
        }
    }

    fn is_overloaded(&self) -> bool {
        match self {
            GenerationError::Status { status, message } => {
                *status == 503 || message.to_ascii_lowercase().contains("overloaded")
            }
            _ => false,
        }
    }
}

/// Every tier failed; carries the last error.
#[derive(Debug, Error)]
#[error("generation failed after {attempts} attempt(s): {last}")]
pub struct GenerationFailure {
    pub attempts: u32,
    #[source]
    pub last: GenerationError,
}

impl GenerationFailure {
    /// One-line message for end users.
    pub fn friendly_message(&self) -> String {
        let reason = match &self.last {
            GenerationError::Network(_) => "网络连接不稳定 (Network Error)".to_string(),
            e if e.is_rate_limit() => "请求过于频繁，请稍后重试 (Rate Limit)".to_string(),
            e if e.is_overloaded() => "AI 模型服务繁忙 (Service Overloaded)".to_string(),
            other => other.to_string(),
        };
        format!("服务调用失败: {reason}。请检查网络后重试。")
    }
}
