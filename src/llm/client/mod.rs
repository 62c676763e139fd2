//! LLM客户端 - 基于rig的LanguageModel实现

use anyhow::Result;
use async_trait::async_trait;
use rig::completion::{AssistantContent, Message, PromptError};
use std::sync::Arc;
use tokio::sync::Semaphore;

mod providers;

use providers::{ProviderAgent, ProviderClient};

use crate::config::{Config, LLMConfig};
use crate::llm::invoker::{InvokeError, InvokeRequest, LanguageModel, ToolBinding, classify_invoke_error};
use crate::llm::tools::scholar_search::AgentToolScholarSearch;

/// 工具回合的最大迭代次数
const MAX_TOOL_TURNS: usize = 6;

/// LLM客户端 - 提供统一的模型调用接口
///
/// 内部持有一个按max_parallels配额的信号量，作为全进程共享的并发
/// 预算：多条工作流运行共享同一个LLMClient时自动互相限流。
#[derive(Clone)]
pub struct LLMClient {
    config: Config,
    client: ProviderClient,
    scholar_search: AgentToolScholarSearch,
    limiter: Arc<Semaphore>,
}

impl LLMClient {
    /// 创建新的LLM客户端
    pub fn new(config: Config) -> Result<Self> {
        let client = ProviderClient::new(&config.llm)?;
        let limiter = Arc::new(Semaphore::new(config.llm.max_parallels.max(1)));

        Ok(Self {
            client,
            scholar_search: AgentToolScholarSearch::new(),
            limiter,
            config,
        })
    }

    /// 检查模型连接和功能是否正常
    pub async fn check_connection(&self) -> Result<()> {
        println!("🔄 正在检查模型连接...");
        let agent = self.client.create_agent(
            &self.config.llm.model_efficient,
            "System: You are a helpful assistant.",
            &self.config.llm,
        );
        match agent.prompt("Hello").await {
            Ok(_) => {
                println!("✅ 模型连接正常");
                Ok(())
            }
            Err(e) => {
                eprintln!("❌ 模型连接失败: {}", e);
                Err(e)
            }
        }
    }

    /// 单轮调用（无工具）
    async fn prompt_plain(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let model = evaluate_befitting_model(&self.config.llm, system_prompt, user_prompt);
        let agent = self
            .client
            .create_agent(model, system_prompt, &self.config.llm);
        agent.prompt(user_prompt).await
    }

    /// 带文献检索工具的多轮调用
    ///
    /// 达到最大工具回合数时不直接报错，而是从对话历史中抢救出最后一段
    /// 助手文本作为部分结果返回。
    async fn prompt_with_search(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let model = evaluate_befitting_model(&self.config.llm, system_prompt, user_prompt);
        let agent = self.client.create_agent_with_search(
            model,
            system_prompt,
            &self.config.llm,
            &self.scholar_search,
        );

        match agent.multi_turn(user_prompt, MAX_TOOL_TURNS).await {
            Ok(response) => Ok(response),
            Err(PromptError::MaxDepthError {
                max_depth,
                chat_history,
                prompt: _,
            }) => {
                if self.config.verbose {
                    println!("   ⚠️ 达到最大工具回合数 ({}), 回收部分结果", max_depth);
                }
                extract_partial_text(&chat_history)
                    .ok_or_else(|| anyhow::anyhow!("达到最大工具回合数({})且无可用文本", max_depth))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl LanguageModel for LLMClient {
    async fn invoke(&self, request: InvokeRequest) -> Result<String, InvokeError> {
        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|e| InvokeError::Permanent(format!("并发预算已关闭: {}", e)))?;

        let use_search = request.tools == ToolBinding::ScholarSearch
            && !self.config.llm.disable_search_tool;

        let result = if use_search {
            self.prompt_with_search(&request.system_prompt, &request.user_prompt)
                .await
        } else {
            self.prompt_plain(&request.system_prompt, &request.user_prompt)
                .await
        };

        result.map_err(|e| classify_invoke_error(&e))
    }
}

/// 按prompt规模选择合适的模型：常规长度走高能效模型，超长上下文走高质量模型
fn evaluate_befitting_model<'a>(
    llm_config: &'a LLMConfig,
    system_prompt: &str,
    user_prompt: &str,
) -> &'a str {
    if system_prompt.len() + user_prompt.len() <= 32 * 1024 {
        &llm_config.model_efficient
    } else {
        &llm_config.model_powerful
    }
}

/// 从对话历史中提取最后一段助手文本
fn extract_partial_text(chat_history: &[Message]) -> Option<String> {
    chat_history.iter().rev().find_map(|msg| {
        if let Message::Assistant { content, .. } = msg {
            let text_content = content
                .iter()
                .filter_map(|c| {
                    if let AssistantContent::Text(text) = c {
                        Some(text.text.clone())
                    } else {
                        None
                    }
                })
                .collect::<Vec<_>>()
                .join("\n");

            if !text_content.is_empty() {
                Some(text_content)
            } else {
                None
            }
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LLMConfig;

    #[test]
    fn test_model_selection_by_prompt_size() {
        let config = LLMConfig::default();

        let model = evaluate_befitting_model(&config, "short system", "short user");
        assert_eq!(model, config.model_efficient);

        let huge_prompt = "x".repeat(64 * 1024);
        let model = evaluate_befitting_model(&config, "system", &huge_prompt);
        assert_eq!(model, config.model_powerful);
    }
}
