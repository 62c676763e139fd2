use crate::llm::ToolBinding;
use crate::types::QualityValidation;
use crate::workflow::context::ArtifactKeys;
use crate::workflow::stage_agent::{AgentDataConfig, ArtifactSource, PromptTemplate, StageAgent};
use crate::workflow::state::WorkflowState;

/// 质量校验智能体 - 对完整计划书做多维度评审
///
/// 模型返回的pass判定只是初步意见，编排器随后会执行评分治理策略
/// （阈值与critical级问题的强制否决、时间预算核对）。
#[derive(Default)]
pub struct QualityControlAgent;

impl StageAgent for QualityControlAgent {
    type Output = QualityValidation;

    fn stage(&self) -> WorkflowState {
        WorkflowState::QualityControl
    }

    fn artifact_key(&self) -> &'static str {
        ArtifactKeys::QUALITY_VALIDATION
    }

    fn data_config(&self) -> AgentDataConfig {
        AgentDataConfig {
            required_sources: vec![
                ArtifactSource::UserProfile,
                ArtifactSource::ProblemDefinition,
                ArtifactSource::ResearchObjectives,
                ArtifactSource::Methodology,
                ArtifactSource::DataCollectionPlan,
            ],
            optional_sources: vec![],
        }
    }

    fn prompt_template(&self) -> PromptTemplate {
        PromptTemplate {
            system_prompt: r#"你是一个严格的学术计划书评审员，负责对完整的研究计划书做多维度校验。

评审维度：
1. 内部一致性（coherence_score，0-1）：目标是否回应问题、方法论是否匹配目标、采集技术是否匹配方法论
2. 可行性（feasibility_score，0-1）：时间预算、每周投入、技能差距、样本量是否现实
3. 约束合规：用户声明的约束是否全部被尊重
4. 时间表现实性：各阶段时长是否装得进总时间预算

评分规则：
- overall_quality_score = ((coherence_score + feasibility_score) / 2) * 100，四舍五入
- validation_passed 仅当 coherence_score >= 0.65 且 feasibility_score >= 0.65 且不存在critical级问题时为 true
- coherence_score < 0.65 或 feasibility_score < 0.65 时 requires_refinement = true
- 存在critical级问题时 requires_refinement = true
- requires_refinement 为 true 时，refinement_targets 必须列出需要重做的组件

每个问题必须包含：severity（critical|major|minor）、component（problem_definition|objectives|methodology|data_collection）、description、impact。
recommendations 必须具体、可执行、按影响排序。

请以结构化的JSON格式返回校验结果。"#
                .to_string(),

            opening_instruction: "对以下研究计划书的全部组件做严格的质量校验：".to_string(),

            closing_instruction: r#"
## 校验要求：
- 逐条核对评分规则，不要给出无依据的通过判定
- 问题描述要指明具体组件与具体矛盾
- 建议必须能直接指导下一轮修订"#
                .to_string(),

            tools: ToolBinding::None,
        }
    }
}
