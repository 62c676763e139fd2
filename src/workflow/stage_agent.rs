//! 阶段智能体抽象 - 声明式的输入依赖与Prompt模板

use schemars::JsonSchema;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::llm::ToolBinding;
use crate::types::{UserProfile, Validate};
use crate::workflow::context::{ArtifactKeys, RunContext};
use crate::workflow::state::WorkflowState;

/// 阶段可声明依赖的上游产物
///
/// 每个阶段只拿到自己声明的产物，而不是整个上下文，以控制prompt体积
/// 并避免无关历史的泄漏。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactSource {
    UserProfile,
    ProblemDefinition,
    ResearchObjectives,
    Methodology,
    DataCollectionPlan,
}

impl ArtifactSource {
    pub const fn key(&self) -> &'static str {
        match self {
            ArtifactSource::UserProfile => ArtifactKeys::USER_PROFILE,
            ArtifactSource::ProblemDefinition => ArtifactKeys::PROBLEM_DEFINITION,
            ArtifactSource::ResearchObjectives => ArtifactKeys::RESEARCH_OBJECTIVES,
            ArtifactSource::Methodology => ArtifactKeys::METHODOLOGY,
            ArtifactSource::DataCollectionPlan => ArtifactKeys::DATA_COLLECTION_PLAN,
        }
    }

    /// 在prompt中对应的小节标题
    pub const fn title(&self) -> &'static str {
        match self {
            ArtifactSource::UserProfile => "用户画像",
            ArtifactSource::ProblemDefinition => "研究问题定义",
            ArtifactSource::ResearchObjectives => "研究目标",
            ArtifactSource::Methodology => "方法论推荐",
            ArtifactSource::DataCollectionPlan => "数据采集计划",
        }
    }
}

/// 阶段的数据依赖配置
#[derive(Debug, Clone)]
pub struct AgentDataConfig {
    /// 必需的上游产物 - 缺失时阶段直接失败
    pub required_sources: Vec<ArtifactSource>,
    /// 可选的上游产物 - 缺失时不影响执行
    pub optional_sources: Vec<ArtifactSource>,
}

impl AgentDataConfig {
    /// required + optional 的合并视图，按声明顺序
    pub fn all_sources(&self) -> Vec<ArtifactSource> {
        [self.required_sources.clone(), self.optional_sources.clone()].concat()
    }
}

/// Prompt模板配置
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    /// 系统提示词
    pub system_prompt: String,
    /// 开头的说明性指令
    pub opening_instruction: String,
    /// 结尾的强调性指令
    pub closing_instruction: String,
    /// 本阶段绑定的工具能力
    pub tools: ToolBinding,
}

/// 阶段智能体 - 每个流水线阶段实现一份
///
/// 智能体只做声明（输出类型、依赖、prompt），执行统一交给StageRunner。
pub trait StageAgent: Send + Sync {
    /// 阶段的输出产物类型
    type Output: JsonSchema + DeserializeOwned + Serialize + Validate + Send + Sync + 'static;

    /// 对应的工作流状态
    fn stage(&self) -> WorkflowState;

    /// 产物在Memory与运行结果中的键
    fn artifact_key(&self) -> &'static str;

    /// 数据依赖配置
    fn data_config(&self) -> AgentDataConfig;

    /// Prompt模板配置
    fn prompt_template(&self) -> PromptTemplate;
}

/// 依赖产物的统一格式化器
pub struct DataFormatter;

impl DataFormatter {
    /// 把声明的产物依赖渲染为prompt的参考材料部分
    ///
    /// 用户画像用结构化摘要呈现，其余产物以pretty JSON小节呈现。
    pub async fn format_sources(ctx: &RunContext, sources: &[ArtifactSource]) -> String {
        let mut content = String::new();

        for source in sources {
            match source {
                ArtifactSource::UserProfile => {
                    if let Some(profile) = ctx.get_artifact::<UserProfile>(source.key()).await {
                        content.push_str(&Self::format_user_profile(&profile));
                    }
                }
                _ => {
                    if let Some(value) =
                        ctx.get_artifact::<serde_json::Value>(source.key()).await
                    {
                        content.push_str(&format!(
                            "### {}\n```json\n{}\n```\n\n",
                            source.title(),
                            serde_json::to_string_pretty(&value).unwrap_or_default()
                        ));
                    }
                }
            }
        }

        content
    }

    /// 格式化用户画像
    pub fn format_user_profile(profile: &UserProfile) -> String {
        let mut content = String::from("### 用户画像\n");
        content.push_str(&format!("- 学位项目: {}\n", profile.academic_program));
        content.push_str(&format!("- 学科领域: {}\n", profile.field_of_study));
        content.push_str(&format!("- 研究方向: {}\n", profile.research_area));
        content.push_str(&format!("- 每周可投入: {} 小时\n", profile.weekly_hours));
        content.push_str(&format!("- 总时间预算: {}\n", profile.total_timeline));
        content.push_str(&format!(
            "- 已有技能: {}\n",
            format_list(&profile.existing_skills)
        ));
        content.push_str(&format!(
            "- 欠缺技能: {}\n",
            format_list(&profile.missing_skills)
        ));
        content.push_str(&format!(
            "- 约束条件: {}\n",
            format_list(&profile.constraints)
        ));
        if let Some(extra) = &profile.additional_context {
            content.push_str(&format!("- 补充信息: {}\n", extra));
        }
        content.push('\n');
        content
    }
}

fn format_list(items: &[String]) -> String {
    if items.is_empty() {
        "无".to_string()
    } else {
        items.join("、")
    }
}
