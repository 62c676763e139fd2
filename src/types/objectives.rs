use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::Validate;
use crate::types::problem::ProblemDefinition;

/// 可行性评估说明
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct FeasibilityNotes {
    /// 时间预算层面的评估
    #[serde(default)]
    pub timeline_assessment: String,
    /// 达成目标所需的技能
    #[serde(default)]
    pub required_skills: Vec<String>,
    /// 风险因素
    #[serde(default)]
    pub risk_factors: Vec<String>,
}

/// 研究问题与具体目标之间的对齐关系
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct AlignmentCheck {
    /// 每个研究问题映射到覆盖它的具体目标
    #[serde(default)]
    pub question_to_objectives: BTreeMap<String, Vec<String>>,
    /// 整体一致性评分（0-1）
    #[serde(default)]
    pub coherence_rating: f64,
}

/// 研究目标
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ResearchObjectives {
    /// 总目标
    pub general_objective: String,
    /// 3-5条具体目标，每条需要可检验且有时间界定
    pub specific_objectives: Vec<String>,
    /// 可行性说明
    #[serde(default)]
    pub feasibility_notes: FeasibilityNotes,
    /// 对齐检查
    #[serde(default)]
    pub alignment: AlignmentCheck,
}

impl ResearchObjectives {
    /// 找出没有映射到任何具体目标的研究问题
    ///
    /// 覆盖缺口只作为报告项，不构成硬性校验失败。
    pub fn coverage_gaps(&self, problem: &ProblemDefinition) -> Vec<String> {
        problem
            .all_questions()
            .into_iter()
            .filter(|question| {
                self.alignment
                    .question_to_objectives
                    .get(*question)
                    .is_none_or(|objectives| objectives.is_empty())
            })
            .map(|question| question.to_string())
            .collect()
    }
}

impl Validate for ResearchObjectives {
    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.general_objective.trim().is_empty() {
            errors.push("general_objective 不能为空".to_string());
        }
        if self.specific_objectives.len() < 3 || self.specific_objectives.len() > 5 {
            errors.push(format!(
                "specific_objectives 应包含3-5条，当前为{}条",
                self.specific_objectives.len()
            ));
        }
        if !(0.0..=1.0).contains(&self.alignment.coherence_rating) {
            errors.push(format!(
                "alignment.coherence_rating 应在0-1之间，当前为{}",
                self.alignment.coherence_rating
            ));
        }

        errors
    }
}
