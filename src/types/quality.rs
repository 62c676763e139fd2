use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::types::Validate;
use crate::types::data_collection::DataCollectionPlan;
use crate::types::profile::UserProfile;

/// 问题严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Critical,
    Major,
    Minor,
}

/// 质量校验发现的单个问题
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ValidationIssue {
    pub severity: IssueSeverity,
    /// 问题所在的组件（problem_definition、objectives、methodology、data_collection）
    pub component: String,
    pub description: String,
    /// 对计划书整体的影响
    #[serde(default)]
    pub impact: String,
}

/// 质量校验结果
///
/// 模型的自我判定不可信：validation_passed 与 requires_refinement 最终
/// 以 enforce_scoring_policy / check_timeline_budget 的治理结论为准。
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct QualityValidation {
    /// 是否通过校验
    pub validation_passed: bool,
    /// 内部一致性评分（0-1）
    pub coherence_score: f64,
    /// 可行性评分（0-1）
    pub feasibility_score: f64,
    /// 总体质量评分（0-100）
    pub overall_quality_score: f64,
    /// 发现的问题
    #[serde(default)]
    pub issues_identified: Vec<ValidationIssue>,
    /// 改进建议
    #[serde(default)]
    pub recommendations: Vec<String>,
    /// 是否需要精炼
    pub requires_refinement: bool,
    /// 需要重做的组件
    #[serde(default)]
    pub refinement_targets: Vec<String>,
}

impl QualityValidation {
    pub fn has_critical_issues(&self) -> bool {
        self.issues_identified
            .iter()
            .any(|issue| issue.severity == IssueSeverity::Critical)
    }

    /// 执行评分治理策略
    ///
    /// 不论模型自称通过与否：总体评分低于阈值、或存在critical级问题时，
    /// validation_passed 一律强制置为false；critical级问题同时强制进入
    /// 精炼流程并补齐refinement_targets。
    pub fn enforce_scoring_policy(&mut self, pass_threshold: f64) {
        self.coherence_score = self.coherence_score.clamp(0.0, 1.0);
        self.feasibility_score = self.feasibility_score.clamp(0.0, 1.0);
        self.overall_quality_score = self.overall_quality_score.clamp(0.0, 100.0);

        if self.overall_quality_score < pass_threshold || self.has_critical_issues() {
            self.validation_passed = false;
        }

        if self.has_critical_issues() {
            self.requires_refinement = true;
            for issue in &self.issues_identified {
                if issue.severity == IssueSeverity::Critical
                    && !self.refinement_targets.contains(&issue.component)
                {
                    self.refinement_targets.push(issue.component.clone());
                }
            }
        }
    }

    /// 核对数据采集时间表是否超出用户的总时间预算
    ///
    /// 超出时注入一条可行性问题并判定不通过，同时要求精炼数据采集计划。
    pub fn check_timeline_budget(&mut self, profile: &UserProfile, plan: &DataCollectionPlan) {
        let budget_weeks = profile.total_timeline.as_weeks();
        let planned_weeks = plan.timeline_breakdown.total_weeks();

        if planned_weeks <= budget_weeks {
            return;
        }

        self.issues_identified.push(ValidationIssue {
            severity: IssueSeverity::Major,
            component: "data_collection".to_string(),
            description: format!(
                "数据采集各阶段合计约{:.1}周，超出总时间预算（{} ≈ {:.1}周）",
                planned_weeks, profile.total_timeline, budget_weeks
            ),
            impact: "按当前时间表无法在计划周期内完成数据采集".to_string(),
        });
        self.validation_passed = false;
        self.requires_refinement = true;
        if !self.refinement_targets.contains(&"data_collection".to_string()) {
            self.refinement_targets.push("data_collection".to_string());
        }
    }
}

impl Validate for QualityValidation {
    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if !(0.0..=1.0).contains(&self.coherence_score) {
            errors.push(format!(
                "coherence_score 应在0-1之间，当前为{}",
                self.coherence_score
            ));
        }
        if !(0.0..=1.0).contains(&self.feasibility_score) {
            errors.push(format!(
                "feasibility_score 应在0-1之间，当前为{}",
                self.feasibility_score
            ));
        }
        if !(0.0..=100.0).contains(&self.overall_quality_score) {
            errors.push(format!(
                "overall_quality_score 应在0-100之间，当前为{}",
                self.overall_quality_score
            ));
        }
        if self.requires_refinement && self.refinement_targets.is_empty() {
            errors.push("requires_refinement 为true时 refinement_targets 不能为空".to_string());
        }

        errors
    }
}
