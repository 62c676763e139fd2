use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::types::Validate;
use crate::types::timeline::TimeSpan;

/// 访谈产出的用户画像，是整条流水线的初始输入
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UserProfile {
    /// 学位项目，例如本科、硕士、博士
    pub academic_program: String,
    /// 学科领域
    pub field_of_study: String,
    /// 具体的研究方向
    pub research_area: String,
    /// 每周可投入的小时数
    pub weekly_hours: u32,
    /// 研究可用的总时间跨度
    pub total_timeline: TimeSpan,
    /// 已掌握的技能
    #[serde(default)]
    pub existing_skills: Vec<String>,
    /// 欠缺的技能
    #[serde(default)]
    pub missing_skills: Vec<String>,
    /// 约束条件（如无法实地调研、软件许可受限等）
    #[serde(default)]
    pub constraints: Vec<String>,
    /// 用户补充的其他背景信息
    #[serde(default)]
    pub additional_context: Option<String>,
}

impl Validate for UserProfile {
    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.academic_program.trim().is_empty() {
            errors.push("academic_program 不能为空".to_string());
        }
        if self.field_of_study.trim().is_empty() {
            errors.push("field_of_study 不能为空".to_string());
        }
        if self.research_area.trim().is_empty() {
            errors.push("research_area 不能为空".to_string());
        }
        if self.weekly_hours == 0 {
            errors.push("weekly_hours 必须为正整数".to_string());
        }
        if self.total_timeline.value == 0 {
            errors.push("total_timeline.value 必须为正整数".to_string());
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::timeline::TimeUnit;

    fn sample_profile() -> UserProfile {
        UserProfile {
            academic_program: "Master's".to_string(),
            field_of_study: "Computer Science".to_string(),
            research_area: "Federated learning on edge devices".to_string(),
            weekly_hours: 10,
            total_timeline: TimeSpan::new(6, TimeUnit::Months),
            existing_skills: vec!["Python".to_string(), "Statistics".to_string()],
            missing_skills: vec!["Distributed systems".to_string()],
            constraints: vec!["remote only".to_string()],
            additional_context: None,
        }
    }

    #[test]
    fn test_valid_profile() {
        assert!(sample_profile().validate().is_empty());
    }

    #[test]
    fn test_zero_weekly_hours_rejected() {
        let mut profile = sample_profile();
        profile.weekly_hours = 0;
        let errors = profile.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("weekly_hours"));
    }

    #[test]
    fn test_zero_timeline_rejected() {
        let mut profile = sample_profile();
        profile.total_timeline.value = 0;
        assert!(!profile.validate().is_empty());
    }

    #[test]
    fn test_blank_fields_rejected() {
        let mut profile = sample_profile();
        profile.academic_program = "  ".to_string();
        profile.research_area = String::new();
        assert_eq!(profile.validate().len(), 2);
    }
}
