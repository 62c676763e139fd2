use crate::llm::ToolBinding;
use crate::types::DataCollectionPlan;
use crate::workflow::context::ArtifactKeys;
use crate::workflow::stage_agent::{AgentDataConfig, ArtifactSource, PromptTemplate, StageAgent};
use crate::workflow::state::WorkflowState;

/// 数据采集规划智能体
#[derive(Default)]
pub struct DataCollectionAgent;

impl StageAgent for DataCollectionAgent {
    type Output = DataCollectionPlan;

    fn stage(&self) -> WorkflowState {
        WorkflowState::DataCollection
    }

    fn artifact_key(&self) -> &'static str {
        ArtifactKeys::DATA_COLLECTION_PLAN
    }

    fn data_config(&self) -> AgentDataConfig {
        AgentDataConfig {
            required_sources: vec![
                ArtifactSource::UserProfile,
                ArtifactSource::ResearchObjectives,
                ArtifactSource::Methodology,
            ],
            optional_sources: vec![],
        }
    }

    fn prompt_template(&self) -> PromptTemplate {
        PromptTemplate {
            system_prompt: r#"你是一个专业的学术研究顾问，专注于数据采集方案设计。

你的任务是基于推荐的方法论与研究目标，产出：
1. 数据采集技术清单
2. 推荐工具（名称、用途、类别、可获得性、学习曲线、替代选项）
3. 数据来源
4. 预估样本量或数据规模
5. 分阶段时间表：preparation、collection、quality_check 三个阶段各给出时长（value + unit）
6. 资源需求

请以结构化的JSON格式返回分析结果。"#
                .to_string(),

            opening_instruction: "基于以下材料，设计可执行的数据采集计划：".to_string(),

            closing_instruction: r#"
## 设计要求：
- 三个阶段的总时长不得超过用户的总时间预算
- 推荐工具必须与用户的约束条件兼容
- 样本量估计要与方法论和时间预算相称"#
                .to_string(),

            tools: ToolBinding::None,
        }
    }
}
