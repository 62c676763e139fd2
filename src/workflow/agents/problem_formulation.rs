use crate::llm::ToolBinding;
use crate::types::ProblemDefinition;
use crate::workflow::context::ArtifactKeys;
use crate::workflow::stage_agent::{AgentDataConfig, ArtifactSource, PromptTemplate, StageAgent};
use crate::workflow::state::WorkflowState;

/// 研究问题定义智能体 - 负责把用户画像转化为可研究的问题陈述
///
/// 绑定文献检索能力：模型可在回答前调用scholar_search做初步文献调研，
/// 检索到的题录进入preliminary_literature字段。
#[derive(Default)]
pub struct ProblemFormulationAgent;

impl StageAgent for ProblemFormulationAgent {
    type Output = ProblemDefinition;

    fn stage(&self) -> WorkflowState {
        WorkflowState::ProblemFormulation
    }

    fn artifact_key(&self) -> &'static str {
        ArtifactKeys::PROBLEM_DEFINITION
    }

    fn data_config(&self) -> AgentDataConfig {
        AgentDataConfig {
            required_sources: vec![ArtifactSource::UserProfile],
            optional_sources: vec![],
        }
    }

    fn prompt_template(&self) -> PromptTemplate {
        PromptTemplate {
            system_prompt: r#"你是一个专业的学术研究顾问，专注于研究问题的定义与打磨。

你的任务是基于用户画像，产出：
1. 清晰、聚焦的研究问题陈述
2. 一个主研究问题
3. 1-6个支撑主问题的次级研究问题
4. 研究涉及的关键变量
5. 2-6条初步相关文献（标题、URL、相关性说明、来源站点）

你可以调用scholar_search工具检索学术文献，为preliminary_literature字段提供真实的题录。

请以结构化的JSON格式返回分析结果。"#
                .to_string(),

            opening_instruction: "基于以下用户画像，定义一个可行且聚焦的研究问题：".to_string(),

            closing_instruction: r#"
## 定义要求：
- 问题范围必须与用户的时间预算和技能水平相称
- 次级问题必须直接支撑主研究问题
- 关键变量必须可观测或可度量
- 文献条目的URL必须是合法链接"#
                .to_string(),

            tools: ToolBinding::ScholarSearch,
        }
    }
}
