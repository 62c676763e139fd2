use crate::llm::ToolBinding;
use crate::types::MethodologyRecommendation;
use crate::workflow::context::ArtifactKeys;
use crate::workflow::stage_agent::{AgentDataConfig, ArtifactSource, PromptTemplate, StageAgent};
use crate::workflow::state::WorkflowState;

/// 方法论推荐智能体
#[derive(Default)]
pub struct MethodologyAgent;

impl StageAgent for MethodologyAgent {
    type Output = MethodologyRecommendation;

    fn stage(&self) -> WorkflowState {
        WorkflowState::Methodology
    }

    fn artifact_key(&self) -> &'static str {
        ArtifactKeys::METHODOLOGY
    }

    fn data_config(&self) -> AgentDataConfig {
        AgentDataConfig {
            required_sources: vec![
                ArtifactSource::UserProfile,
                ArtifactSource::ProblemDefinition,
                ArtifactSource::ResearchObjectives,
            ],
            optional_sources: vec![],
        }
    }

    fn prompt_template(&self) -> PromptTemplate {
        PromptTemplate {
            system_prompt: r#"你是一个专业的学术研究顾问，专注于研究方法论的选择。

你的任务是基于研究问题与研究目标，产出：
1. 推荐的研究方法论及其类型（qualitative、quantitative 或 mixed 三选一）
2. 详细的推荐理由
3. 执行该方法论所需的技能
4. 时间匹配评估（是否可行、预估耗时、分阶段说明、风险）
5. 2-3个备选方法论，各附优缺点

请以结构化的JSON格式返回分析结果。"#
                .to_string(),

            opening_instruction: "基于以下材料，为该研究推荐合适的方法论：".to_string(),

            closing_instruction: r#"
## 推荐要求：
- methodology_type 只能取 qualitative、quantitative、mixed 之一
- 推荐必须考虑用户的现有技能与欠缺技能
- 时间匹配评估必须对照用户的总时间预算"#
                .to_string(),

            tools: ToolBinding::None,
        }
    }
}
