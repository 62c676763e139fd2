//! 阶段执行器 - 组装上下文、调用模型、重试与纠偏、提取产物

use rand::Rng;
use schemars::schema_for;
use std::time::Duration;

use crate::config::Config;
use crate::llm::extractor::{ExtractionError, extract_typed};
use crate::llm::invoker::{InvokeError, InvokeRequest};
use crate::workflow::context::RunContext;
use crate::workflow::error::{StageError, StageErrorKind};
use crate::workflow::stage_agent::{DataFormatter, StageAgent};
use crate::workflow::state::WorkflowState;

/// 单次退避的上限
const MAX_BACKOFF_MS: u64 = 60_000;

/// 阶段执行器
///
/// 重试策略：瞬态错误按指数退避重试（带抖动），永久错误立即失败；
/// 提取失败走独立的纠偏重问预算，二者互不挪用。
pub struct StageRunner {
    retry_attempts: u32,
    retry_delay_ms: u64,
    max_repair_prompts: u32,
}

impl StageRunner {
    pub fn new(config: &Config) -> Self {
        Self {
            retry_attempts: config.llm.retry_attempts.max(1),
            retry_delay_ms: config.llm.retry_delay_ms,
            max_repair_prompts: config.workflow.max_repair_prompts,
        }
    }

    /// 执行一个阶段，返回通过校验的产物
    pub async fn run_stage<A>(
        &self,
        ctx: &RunContext,
        agent: &A,
        extra_context: Option<String>,
    ) -> Result<A::Output, StageError>
    where
        A: StageAgent,
    {
        let stage = agent.stage();
        let data_config = agent.data_config();

        // 必需输入缺失说明编排顺序被破坏，直接失败
        for source in &data_config.required_sources {
            if !ctx.has_artifact(source.key()).await {
                return Err(StageError::new(
                    stage,
                    StageErrorKind::MissingInput(source.key().to_string()),
                ));
            }
        }

        let template = agent.prompt_template();
        let system_prompt = format!(
            "{}\n\n{}",
            template.system_prompt,
            ctx.config.target_language.prompt_instruction()
        );

        let materials = DataFormatter::format_sources(ctx, &data_config.all_sources()).await;
        let schema_text =
            serde_json::to_string_pretty(&schema_for!(A::Output)).unwrap_or_default();

        let mut user_prompt = String::new();
        user_prompt.push_str(&template.opening_instruction);
        user_prompt.push_str("\n\n## 参考材料\n");
        user_prompt.push_str(&materials);
        if let Some(extra) = &extra_context {
            user_prompt.push_str(extra);
            user_prompt.push('\n');
        }
        user_prompt.push_str(
            "\n## 输出要求\n仅输出一个符合以下JSON Schema的JSON对象，不要附加任何解释文字或markdown围栏：\n```json\n",
        );
        user_prompt.push_str(&schema_text);
        user_prompt.push_str("\n```\n");
        user_prompt.push_str(&template.closing_instruction);

        let base_prompt = user_prompt.clone();
        let mut request = InvokeRequest {
            system_prompt,
            user_prompt,
            tools: template.tools,
        };

        let mut repair_attempts = 0u32;
        loop {
            let raw = self.invoke_with_retry(ctx, stage, request.clone()).await?;

            match extract_typed::<A::Output>(&raw) {
                Ok(output) => {
                    if ctx.config.verbose {
                        println!("✅ 阶段 [{}] 产物提取成功", stage);
                    }
                    return Ok(output);
                }
                Err(err) => {
                    if let ExtractionError::SchemaViolation { field_errors } = &err {
                        for field_error in field_errors {
                            eprintln!("   ⚠️ 字段违规: {}", field_error);
                        }
                    }

                    if repair_attempts >= self.max_repair_prompts {
                        return Err(StageError::new(stage, StageErrorKind::Extraction(err)));
                    }

                    repair_attempts += 1;
                    eprintln!(
                        "❌ 阶段 [{}] 提取失败，发起纠偏重问 (第 {} / {} 次): {}",
                        stage, repair_attempts, self.max_repair_prompts, err
                    );
                    request.user_prompt = format!(
                        "{}\n\n## 上次输出的问题\n{}\n请修正以上问题后重新输出完整的JSON对象。",
                        base_prompt,
                        corrective_note(&err)
                    );
                }
            }
        }
    }

    /// 调用模型，瞬态错误按指数退避重试
    async fn invoke_with_retry(
        &self,
        ctx: &RunContext,
        stage: WorkflowState,
        request: InvokeRequest,
    ) -> Result<String, StageError> {
        let mut attempt = 0u32;

        loop {
            match ctx.model.invoke(request.clone()).await {
                Ok(text) => return Ok(text),
                Err(InvokeError::Transient(message)) => {
                    attempt += 1;
                    if attempt >= self.retry_attempts {
                        return Err(StageError::new(
                            stage,
                            StageErrorKind::RetriesExhausted(message),
                        ));
                    }

                    let delay = self.backoff_delay(attempt);
                    eprintln!(
                        "❌ 阶段 [{}] 模型调用出错，退避重试 (第 {} / {} 次尝试): {}",
                        stage, attempt, self.retry_attempts, message
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(InvokeError::Permanent(message)) => {
                    return Err(StageError::new(stage, StageErrorKind::Permanent(message)));
                }
            }
        }
    }

    /// 指数退避 + 抖动，封顶60秒
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponential = self
            .retry_delay_ms
            .saturating_mul(1u64 << (attempt.saturating_sub(1)).min(16));
        let base = exponential.min(MAX_BACKOFF_MS);
        let jitter_max = base / 4;
        let jitter = if jitter_max > 0 {
            rand::rng().random_range(0..=jitter_max)
        } else {
            0
        };

        Duration::from_millis(base + jitter)
    }
}

/// 根据提取错误类型生成纠偏说明
fn corrective_note(err: &ExtractionError) -> String {
    match err {
        ExtractionError::Unparseable { sample } => format!(
            "上次响应无法解析出JSON对象（响应预览: {}）。请严格只输出JSON对象本身。",
            sample
        ),
        ExtractionError::SchemaViolation { field_errors } => format!(
            "上次输出的JSON未通过Schema校验：\n{}",
            field_errors
                .iter()
                .map(|e| format!("- {}", e))
                .collect::<Vec<_>>()
                .join("\n")
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runner_with_delay(delay_ms: u64) -> StageRunner {
        StageRunner {
            retry_attempts: 5,
            retry_delay_ms: delay_ms,
            max_repair_prompts: 2,
        }
    }

    #[test]
    fn test_backoff_grows_exponentially() {
        let runner = runner_with_delay(1000);

        let first = runner.backoff_delay(1).as_millis() as u64;
        let second = runner.backoff_delay(2).as_millis() as u64;
        let third = runner.backoff_delay(3).as_millis() as u64;

        // 基础值分别为1000/2000/4000，抖动不超过基础值的1/4
        assert!((1000..=1250).contains(&first));
        assert!((2000..=2500).contains(&second));
        assert!((4000..=5000).contains(&third));
    }

    #[test]
    fn test_backoff_is_capped() {
        let runner = runner_with_delay(10_000);
        let delay = runner.backoff_delay(20).as_millis() as u64;
        assert!(delay <= MAX_BACKOFF_MS + MAX_BACKOFF_MS / 4);
    }

    #[test]
    fn test_corrective_note_lists_field_errors() {
        let note = corrective_note(&ExtractionError::SchemaViolation {
            field_errors: vec!["字段A缺失".to_string(), "字段B越界".to_string()],
        });
        assert!(note.contains("- 字段A缺失"));
        assert!(note.contains("- 字段B越界"));

        let note = corrective_note(&ExtractionError::Unparseable {
            sample: "oops".to_string(),
        });
        assert!(note.contains("oops"));
    }
}
