use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::types::Validate;
use crate::types::timeline::TimeSpan;

/// 推荐的数据采集工具
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RecommendedTool {
    pub name: String,
    /// 用途说明
    pub purpose: String,
    /// 工具类别（问卷平台、传感器、爬虫框架等）
    #[serde(default)]
    pub tool_type: String,
    /// 可获得性（免费、机构许可、付费）
    #[serde(default)]
    pub accessibility: String,
    /// 学习曲线描述
    #[serde(default)]
    pub learning_curve: String,
    /// 替代选项
    #[serde(default)]
    pub alternatives: Vec<String>,
}

/// 数据采集的分阶段时间表
///
/// 三个阶段的总和必须落在用户画像的总时间预算之内，超出时由质量
/// 校验的治理逻辑注入可行性问题。
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PhasedTimeline {
    /// 准备阶段（工具搭建、试点）
    pub preparation: TimeSpan,
    /// 正式采集阶段
    pub collection: TimeSpan,
    /// 数据质量核查阶段
    pub quality_check: TimeSpan,
}

impl PhasedTimeline {
    /// 三个阶段的总时长（周）
    pub fn total_weeks(&self) -> f64 {
        self.preparation.as_weeks() + self.collection.as_weeks() + self.quality_check.as_weeks()
    }
}

/// 数据采集计划
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DataCollectionPlan {
    /// 采集技术
    pub collection_techniques: Vec<String>,
    /// 推荐工具
    #[serde(default)]
    pub recommended_tools: Vec<RecommendedTool>,
    /// 数据来源
    #[serde(default)]
    pub data_sources: Vec<String>,
    /// 预估样本量或数据规模
    pub estimated_sample_size: String,
    /// 分阶段时间表
    pub timeline_breakdown: PhasedTimeline,
    /// 资源需求（人力、经费、设备）
    #[serde(default)]
    pub resource_requirements: Vec<String>,
}

impl Validate for DataCollectionPlan {
    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.collection_techniques.is_empty() {
            errors.push("collection_techniques 至少需要一项".to_string());
        }
        if self.estimated_sample_size.trim().is_empty() {
            errors.push("estimated_sample_size 不能为空".to_string());
        }
        for (field, span) in [
            ("preparation", &self.timeline_breakdown.preparation),
            ("collection", &self.timeline_breakdown.collection),
            ("quality_check", &self.timeline_breakdown.quality_check),
        ] {
            if span.value == 0 {
                errors.push(format!("timeline_breakdown.{} 的时长必须为正", field));
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::timeline::TimeUnit;

    fn sample_plan() -> DataCollectionPlan {
        DataCollectionPlan {
            collection_techniques: vec!["online survey".to_string()],
            recommended_tools: vec![RecommendedTool {
                name: "LimeSurvey".to_string(),
                purpose: "questionnaire hosting".to_string(),
                tool_type: "survey platform".to_string(),
                accessibility: "free".to_string(),
                learning_curve: "low".to_string(),
                alternatives: vec!["Google Forms".to_string()],
            }],
            data_sources: vec!["graduate students".to_string()],
            estimated_sample_size: "120 responses".to_string(),
            timeline_breakdown: PhasedTimeline {
                preparation: TimeSpan::new(2, TimeUnit::Weeks),
                collection: TimeSpan::new(6, TimeUnit::Weeks),
                quality_check: TimeSpan::new(2, TimeUnit::Weeks),
            },
            resource_requirements: vec!["survey incentives budget".to_string()],
        }
    }

    #[test]
    fn test_valid_plan() {
        assert!(sample_plan().validate().is_empty());
    }

    #[test]
    fn test_total_weeks() {
        assert_eq!(sample_plan().timeline_breakdown.total_weeks(), 10.0);
    }

    #[test]
    fn test_zero_phase_rejected() {
        let mut plan = sample_plan();
        plan.timeline_breakdown.collection.value = 0;
        let errors = plan.validate();
        assert!(errors.iter().any(|e| e.contains("collection")));
    }

    #[test]
    fn test_empty_techniques_rejected() {
        let mut plan = sample_plan();
        plan.collection_techniques.clear();
        assert!(!plan.validate().is_empty());
    }
}
