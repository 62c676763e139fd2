//! 模型调用器抽象 - 流水线核心只依赖这一层

use async_trait::async_trait;

/// 阶段可绑定的工具能力
///
/// 核心不关心工具调用的具体回合机制，只声明某个阶段是否带检索能力。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolBinding {
    #[default]
    None,
    /// 学术文献检索
    ScholarSearch,
}

/// 一次模型调用请求
#[derive(Debug, Clone)]
pub struct InvokeRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub tools: ToolBinding,
}

/// 模型调用错误，按可恢复性分类
#[derive(Debug, Clone, thiserror::Error)]
pub enum InvokeError {
    /// 瞬态错误（限流、超时、服务端5xx），允许退避重试
    #[error("模型调用瞬态失败: {0}")]
    Transient(String),
    /// 永久错误（鉴权失败、请求格式非法），重试无意义
    #[error("模型调用永久失败: {0}")]
    Permanent(String),
}

/// 统一的语言模型调用接口
///
/// 实现方负责一次完整的请求/响应（含内部的工具回合），返回最终文本。
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn invoke(&self, request: InvokeRequest) -> Result<String, InvokeError>;
}

/// 把底层调用错误归类为瞬态/永久
///
/// rig把provider错误揉进了错误文本，这里按特征串归类：鉴权类先判永久，
/// 限流、超时与5xx判瞬态，其余默认永久（宁可快速失败也不盲目重试）。
pub fn classify_invoke_error(err: &anyhow::Error) -> InvokeError {
    let message = err.to_string();
    let lowered = message.to_lowercase();

    const PERMANENT_MARKERS: [&str; 7] = [
        "401",
        "403",
        "unauthorized",
        "forbidden",
        "invalid api key",
        "invalid_api_key",
        "permission denied",
    ];
    const TRANSIENT_MARKERS: [&str; 12] = [
        "429",
        "rate limit",
        "too many requests",
        "timeout",
        "timed out",
        "connection reset",
        "connection refused",
        "500",
        "502",
        "503",
        "504",
        "overloaded",
    ];

    if PERMANENT_MARKERS.iter().any(|m| lowered.contains(m)) {
        return InvokeError::Permanent(message);
    }
    if TRANSIENT_MARKERS.iter().any(|m| lowered.contains(m)) {
        return InvokeError::Transient(message);
    }

    InvokeError::Permanent(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_rate_limit_is_transient() {
        let err = anyhow!("HTTP status 429: too many requests");
        assert!(matches!(
            classify_invoke_error(&err),
            InvokeError::Transient(_)
        ));
    }

    #[test]
    fn test_server_errors_are_transient() {
        for text in ["status 500", "bad gateway 502", "503 service unavailable"] {
            let err = anyhow!("{}", text);
            assert!(matches!(
                classify_invoke_error(&err),
                InvokeError::Transient(_)
            ));
        }
    }

    #[test]
    fn test_auth_failure_is_permanent() {
        let err = anyhow!("401 Unauthorized: invalid api key");
        assert!(matches!(
            classify_invoke_error(&err),
            InvokeError::Permanent(_)
        ));
    }

    #[test]
    fn test_unknown_error_defaults_to_permanent() {
        let err = anyhow!("malformed request body");
        assert!(matches!(
            classify_invoke_error(&err),
            InvokeError::Permanent(_)
        ));
    }

    #[test]
    fn test_auth_wins_over_transient_markers() {
        // 带有"403"的网关响应里即使同时出现超时字样，也应按永久处理
        let err = anyhow!("403 forbidden while waiting, request timed out");
        assert!(matches!(
            classify_invoke_error(&err),
            InvokeError::Permanent(_)
        ));
    }
}
