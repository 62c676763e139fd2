//! 工作流编排器 - 驱动状态机走完全部阶段并治理精炼回路

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::llm::{LLMClient, LanguageModel};
use crate::store::{ArtifactStore, FileArtifactStore, NullArtifactStore};
use crate::types::{ProblemDefinition, RefinementRecord, UserProfile, Validate};
use crate::workflow::agents::{
    DataCollectionAgent, MethodologyAgent, ObjectivesAgent, ProblemFormulationAgent,
    QualityControlAgent,
};
use crate::workflow::context::{ArtifactKeys, RunContext};
use crate::workflow::error::{ErrorDescriptor, StageError};
use crate::workflow::progress::{NullProgressSink, ProgressSink};
use crate::workflow::runner::StageRunner;
use crate::workflow::state::{StateMachine, StateTransition, WorkflowState};

/// 运行终态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// 质量校验通过
    Completed,
    /// 精炼预算耗尽后强制完成
    CompletedWithWarnings,
    /// 协作式取消
    Cancelled,
    /// 阶段失败，运行进入ERROR
    Failed,
}

/// 运行元数据
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
    pub run_id: String,
    /// 实际执行的精炼轮数
    pub refinement_iterations: u32,
    /// 是否因精炼预算耗尽而强制完成
    pub forced_completion: bool,
    /// 最终一轮质量校验（经治理后）是否通过
    pub validation_passed: bool,
    /// 未被任何具体目标覆盖的研究问题
    pub alignment_gaps: Vec<String>,
    /// 完整的状态迁移历史
    pub transition_history: Vec<StateTransition>,
}

/// 运行结果
///
/// 失败同样以结构化形式返回：已产出的阶段产物全部保留，错误信息
/// 足以让调用方决定续跑、单阶段重跑还是放弃。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub success: bool,
    pub status: RunStatus,
    /// 各阶段产物的最新修订（仅包含已产出的阶段）
    pub artifacts: HashMap<String, Value>,
    pub metadata: RunMetadata,
    pub error: Option<ErrorDescriptor>,
}

/// 一次驱动的终局
enum DriveOutcome {
    Passed,
    Forced,
    Cancelled,
}

/// 驱动过程中的累计统计
#[derive(Default)]
struct DriveStats {
    refinement_count: u32,
    validation_passed: bool,
    alignment_gaps: Vec<String>,
}

/// 计划书工作流编排器
pub struct ProposalOrchestrator {
    config: Config,
    model: Arc<dyn LanguageModel>,
    store: Arc<dyn ArtifactStore>,
    progress: Arc<dyn ProgressSink>,
    cancellation: CancellationToken,
}

impl ProposalOrchestrator {
    /// 从配置构建，内部创建rig客户端
    pub fn new(config: Config) -> Result<Self> {
        let model: Arc<dyn LanguageModel> = Arc::new(LLMClient::new(config.clone())?);
        Ok(Self::with_model(config, model))
    }

    /// 使用外部提供的模型调用器构建
    pub fn with_model(config: Config, model: Arc<dyn LanguageModel>) -> Self {
        let store: Arc<dyn ArtifactStore> = if config.snapshot.enabled {
            Arc::new(FileArtifactStore::new(config.snapshot.snapshot_dir.clone()))
        } else {
            Arc::new(NullArtifactStore)
        };

        Self {
            config,
            model,
            store,
            progress: Arc::new(NullProgressSink),
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_store(mut self, store: Arc<dyn ArtifactStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// 取消令牌：调用方持有后可在任意时刻请求停止，阶段之间生效
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// 执行一次完整的工作流运行
    ///
    /// 每次调用独占一份RunContext，多次并发run互不共享可变状态。
    pub async fn run(&self, profile: UserProfile) -> RunResult {
        let ctx = RunContext::new(
            self.config.clone(),
            self.model.clone(),
            self.store.clone(),
            self.progress.clone(),
            self.cancellation.clone(),
        );
        let mut machine = StateMachine::new();
        let mut stats = DriveStats::default();

        println!("🚀 开始生成研究计划书 (run: {})...", ctx.run_id);

        let outcome = self.drive(&ctx, &mut machine, &mut stats, profile).await;
        self.finalize(&ctx, &machine, stats, outcome).await
    }

    async fn drive(
        &self,
        ctx: &RunContext,
        machine: &mut StateMachine,
        stats: &mut DriveStats,
        profile: UserProfile,
    ) -> Result<DriveOutcome, ErrorDescriptor> {
        let runner = StageRunner::new(&self.config);
        let max_refinements = self.config.workflow.max_refinements;

        // 画像由访谈层或调用方提供，入库前复验不变量
        self.transition(ctx, machine, WorkflowState::Interviewing)?;
        let profile_errors = profile.validate();
        if !profile_errors.is_empty() {
            let descriptor = ErrorDescriptor {
                stage: WorkflowState::Interviewing.key().to_string(),
                kind: "invalid_profile".to_string(),
                message: profile_errors.join("; "),
            };
            let _ = machine.advance(WorkflowState::Error);
            return Err(descriptor);
        }
        ctx.persist_artifact(ArtifactKeys::USER_PROFILE, &profile, 0).await;

        let mut refinement_context: Option<String> = None;
        let mut refinement_feedback: Option<String> = None;

        loop {
            if self.is_cancelled(ctx) {
                return Ok(DriveOutcome::Cancelled);
            }

            // 问题定义（精炼回边的目标阶段）
            self.transition(ctx, machine, WorkflowState::ProblemFormulation)?;
            let mut problem = match runner
                .run_stage(ctx, &ProblemFormulationAgent, refinement_context.clone())
                .await
            {
                Ok(output) => output,
                Err(err) => return Err(self.stage_failure(machine, &err)),
            };

            // 修订历史由核心维护：首版清空，精炼版在既有历史上追加本轮反馈
            problem.refinement_history = match &refinement_feedback {
                Some(feedback) => {
                    let mut history = ctx
                        .get_artifact::<ProblemDefinition>(ArtifactKeys::PROBLEM_DEFINITION)
                        .await
                        .map(|prior| prior.refinement_history)
                        .unwrap_or_default();
                    history.push(RefinementRecord {
                        iteration: stats.refinement_count,
                        feedback: feedback.clone(),
                        revised_at: Utc::now(),
                    });
                    history
                }
                None => Vec::new(),
            };
            ctx.persist_artifact(
                ArtifactKeys::PROBLEM_DEFINITION,
                &problem,
                stats.refinement_count,
            )
            .await;

            if self.is_cancelled(ctx) {
                return Ok(DriveOutcome::Cancelled);
            }

            // 研究目标
            self.transition(ctx, machine, WorkflowState::Objectives)?;
            let objectives = match runner.run_stage(ctx, &ObjectivesAgent, None).await {
                Ok(output) => output,
                Err(err) => return Err(self.stage_failure(machine, &err)),
            };
            ctx.persist_artifact(
                ArtifactKeys::RESEARCH_OBJECTIVES,
                &objectives,
                stats.refinement_count,
            )
            .await;

            // 对齐覆盖检查：缺口只报告，不打断运行
            stats.alignment_gaps = objectives.coverage_gaps(&problem);
            if stats.alignment_gaps.is_empty() {
                println!("✓ 全部研究问题均被具体目标覆盖");
            } else {
                println!(
                    "⚠️ {} 个研究问题未被目标覆盖: {}",
                    stats.alignment_gaps.len(),
                    stats.alignment_gaps.join("; ")
                );
            }

            if self.is_cancelled(ctx) {
                return Ok(DriveOutcome::Cancelled);
            }

            // 方法论
            self.transition(ctx, machine, WorkflowState::Methodology)?;
            let methodology = match runner.run_stage(ctx, &MethodologyAgent, None).await {
                Ok(output) => output,
                Err(err) => return Err(self.stage_failure(machine, &err)),
            };
            ctx.persist_artifact(
                ArtifactKeys::METHODOLOGY,
                &methodology,
                stats.refinement_count,
            )
            .await;

            if self.is_cancelled(ctx) {
                return Ok(DriveOutcome::Cancelled);
            }

            // 数据采集
            self.transition(ctx, machine, WorkflowState::DataCollection)?;
            let plan = match runner.run_stage(ctx, &DataCollectionAgent, None).await {
                Ok(output) => output,
                Err(err) => return Err(self.stage_failure(machine, &err)),
            };
            ctx.persist_artifact(
                ArtifactKeys::DATA_COLLECTION_PLAN,
                &plan,
                stats.refinement_count,
            )
            .await;

            if self.is_cancelled(ctx) {
                return Ok(DriveOutcome::Cancelled);
            }

            // 质量校验
            self.transition(ctx, machine, WorkflowState::QualityControl)?;
            let mut quality = match runner.run_stage(ctx, &QualityControlAgent, None).await {
                Ok(output) => output,
                Err(err) => return Err(self.stage_failure(machine, &err)),
            };

            // 治理：模型的自我判定不作数，时间预算与评分策略说了算
            quality.check_timeline_budget(&profile, &plan);
            quality.enforce_scoring_policy(self.config.workflow.pass_threshold);
            ctx.persist_artifact(
                ArtifactKeys::QUALITY_VALIDATION,
                &quality,
                stats.refinement_count,
            )
            .await;
            stats.validation_passed = quality.validation_passed;

            if quality.validation_passed {
                println!("🎉 质量校验通过 (总体评分 {:.0})", quality.overall_quality_score);
                self.transition(ctx, machine, WorkflowState::Complete)?;
                return Ok(DriveOutcome::Passed);
            }

            if !quality.requires_refinement || stats.refinement_count >= max_refinements {
                if quality.requires_refinement {
                    println!(
                        "⚠️ 精炼预算已用尽 ({} / {})，携带现有计划书强制完成",
                        stats.refinement_count, max_refinements
                    );
                } else {
                    println!("⚠️ 校验未通过且未要求精炼，携带现有计划书强制完成");
                }
                self.transition(ctx, machine, WorkflowState::Complete)?;
                return Ok(DriveOutcome::Forced);
            }

            stats.refinement_count += 1;
            self.transition(ctx, machine, WorkflowState::Refinement)?;
            println!(
                "🔄 质量校验未通过，进入第 {} / {} 轮精炼",
                stats.refinement_count, max_refinements
            );

            // 下一轮问题定义的修订上下文 = 质量建议 + 当前问题定义
            let feedback = quality.recommendations.join("\n");
            refinement_context = Some(format!(
                "## 上一轮质量校验反馈\n{}\n\n## 当前问题定义（待修订）\n```json\n{}\n```\n",
                feedback,
                serde_json::to_string_pretty(&problem).unwrap_or_default()
            ));
            refinement_feedback = Some(feedback);
        }
    }

    /// 状态迁移 + 进度上报；非法迁移把运行带入ERROR
    fn transition(
        &self,
        ctx: &RunContext,
        machine: &mut StateMachine,
        target: WorkflowState,
    ) -> Result<(), ErrorDescriptor> {
        if let Err(err) = machine.advance(target) {
            let descriptor = ErrorDescriptor::from(&err);
            let _ = machine.advance(WorkflowState::Error);
            return Err(descriptor);
        }

        ctx.report_progress(target);
        Ok(())
    }

    /// 阶段失败：记录错误并把状态机带入ERROR
    fn stage_failure(&self, machine: &mut StateMachine, err: &StageError) -> ErrorDescriptor {
        eprintln!("❌ {}", err);
        let _ = machine.advance(WorkflowState::Error);
        ErrorDescriptor::from(err)
    }

    fn is_cancelled(&self, ctx: &RunContext) -> bool {
        if ctx.cancellation.is_cancelled() {
            println!("🛑 收到取消请求，停止后续阶段");
            true
        } else {
            false
        }
    }

    async fn finalize(
        &self,
        ctx: &RunContext,
        machine: &StateMachine,
        stats: DriveStats,
        outcome: Result<DriveOutcome, ErrorDescriptor>,
    ) -> RunResult {
        let artifacts = ctx.artifacts_snapshot().await;
        let metadata = RunMetadata {
            run_id: ctx.run_id.clone(),
            refinement_iterations: stats.refinement_count,
            forced_completion: matches!(&outcome, Ok(DriveOutcome::Forced)),
            validation_passed: stats.validation_passed,
            alignment_gaps: stats.alignment_gaps,
            transition_history: machine.history().to_vec(),
        };

        match outcome {
            Ok(DriveOutcome::Passed) => RunResult {
                success: true,
                status: RunStatus::Completed,
                artifacts,
                metadata,
                error: None,
            },
            Ok(DriveOutcome::Forced) => RunResult {
                success: true,
                status: RunStatus::CompletedWithWarnings,
                artifacts,
                metadata,
                error: None,
            },
            Ok(DriveOutcome::Cancelled) => RunResult {
                success: false,
                status: RunStatus::Cancelled,
                artifacts,
                metadata,
                error: None,
            },
            Err(descriptor) => RunResult {
                success: false,
                status: RunStatus::Failed,
                artifacts,
                metadata,
                error: Some(descriptor),
            },
        }
    }
}
