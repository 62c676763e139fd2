// 计划书生成工作流
//
// 控制流：Orchestrator -> StageRunner -> (模型调用) -> 结果提取器 ->
// Schema校验 -> 回到Orchestrator推进状态机，直到质量校验通过或
// 精炼预算耗尽。

use std::sync::Arc;

use anyhow::Result;

use crate::config::Config;
use crate::llm::LLMClient;
use crate::types::UserProfile;

pub mod agents;
pub mod context;
pub mod error;
pub mod orchestrator;
pub mod progress;
pub mod runner;
pub mod stage_agent;
pub mod state;

pub use error::{ErrorDescriptor, StageError, StageErrorKind, WorkflowError};
pub use orchestrator::{ProposalOrchestrator, RunMetadata, RunResult, RunStatus};
pub use progress::{CallbackProgressSink, NullProgressSink, ProgressSink};
pub use state::{StateMachine, StateTransition, WorkflowState};

/// 启动一次完整的计划书生成工作流
pub async fn launch(config: &Config, profile: UserProfile) -> Result<RunResult> {
    let client = LLMClient::new(config.clone())?;

    // 启动时检查模型连接
    client.check_connection().await?;

    let orchestrator = ProposalOrchestrator::with_model(config.clone(), Arc::new(client));
    Ok(orchestrator.run(profile).await)
}
