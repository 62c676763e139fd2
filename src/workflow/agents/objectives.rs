use crate::llm::ToolBinding;
use crate::types::ResearchObjectives;
use crate::workflow::context::ArtifactKeys;
use crate::workflow::stage_agent::{AgentDataConfig, ArtifactSource, PromptTemplate, StageAgent};
use crate::workflow::state::WorkflowState;

/// 研究目标智能体 - 把研究问题拆解为可检验的具体目标
#[derive(Default)]
pub struct ObjectivesAgent;

impl StageAgent for ObjectivesAgent {
    type Output = ResearchObjectives;

    fn stage(&self) -> WorkflowState {
        WorkflowState::Objectives
    }

    fn artifact_key(&self) -> &'static str {
        ArtifactKeys::RESEARCH_OBJECTIVES
    }

    fn data_config(&self) -> AgentDataConfig {
        AgentDataConfig {
            required_sources: vec![
                ArtifactSource::UserProfile,
                ArtifactSource::ProblemDefinition,
            ],
            optional_sources: vec![],
        }
    }

    fn prompt_template(&self) -> PromptTemplate {
        PromptTemplate {
            system_prompt: r#"你是一个专业的学术研究顾问，专注于研究目标的制定与对齐校验。

你的任务是基于研究问题定义，产出：
1. 一个总目标
2. 3-5条具体目标，每条都要有时间界定且可检验
3. 可行性说明（时间评估、所需技能、风险因素）
4. 对齐映射：question_to_objectives 以每个研究问题原文为键（包含主问题与全部次级问题，逐字一致），值为覆盖该问题的具体目标列表
5. 整体一致性评分（0-1）

请以结构化的JSON格式返回分析结果。"#
                .to_string(),

            opening_instruction: "基于以下用户画像与研究问题定义，制定研究目标：".to_string(),

            closing_instruction: r#"
## 制定要求：
- 每个研究问题都应至少被一条具体目标覆盖
- 具体目标必须在用户的时间预算内可完成
- question_to_objectives 的键必须与研究问题原文逐字一致"#
                .to_string(),

            tools: ToolBinding::None,
        }
    }
}
