use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::types::Validate;

/// 方法论类型，固定三值枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum MethodologyType {
    Qualitative,
    Quantitative,
    Mixed,
}

impl std::fmt::Display for MethodologyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MethodologyType::Qualitative => write!(f, "qualitative"),
            MethodologyType::Quantitative => write!(f, "quantitative"),
            MethodologyType::Mixed => write!(f, "mixed"),
        }
    }
}

/// 方法论与可用时间的匹配评估
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct TimelineFit {
    /// 在当前时间预算内是否可行
    #[serde(default)]
    pub feasible: bool,
    /// 预估耗时描述
    #[serde(default)]
    pub estimated_duration: String,
    /// 分阶段说明
    #[serde(default)]
    pub phase_breakdown: Vec<String>,
    /// 风险
    #[serde(default)]
    pub risks: Vec<String>,
}

/// 备选方法论
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AlternativeMethodology {
    pub name: String,
    #[serde(default)]
    pub pros: Vec<String>,
    #[serde(default)]
    pub cons: Vec<String>,
}

/// 方法论推荐
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MethodologyRecommendation {
    /// 推荐的研究方法论
    pub recommended_methodology: String,
    /// 方法论类型
    pub methodology_type: MethodologyType,
    /// 推荐理由
    pub justification: String,
    /// 执行该方法论所需的技能
    #[serde(default)]
    pub required_skills: Vec<String>,
    /// 时间匹配评估
    #[serde(default)]
    pub timeline_fit: TimelineFit,
    /// 备选方法论及其优缺点
    #[serde(default)]
    pub alternative_methodologies: Vec<AlternativeMethodology>,
}

impl Validate for MethodologyRecommendation {
    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.recommended_methodology.trim().is_empty() {
            errors.push("recommended_methodology 不能为空".to_string());
        }
        if self.justification.trim().is_empty() {
            errors.push("justification 不能为空".to_string());
        }

        errors
    }
}
