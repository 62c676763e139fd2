use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::types::Validate;

/// 初步文献检索得到的单条文献
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LiteratureEntry {
    /// 论文或文章标题
    pub title: String,
    /// 资源链接
    pub url: String,
    /// 与研究方向的相关性说明
    pub relevance_note: String,
    /// 来源站点（如 arxiv.org、ieee.org）
    #[serde(default)]
    pub source: Option<String>,
}

/// 一次精炼迭代的记录，追加写入、永不覆盖
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RefinementRecord {
    /// 第几轮精炼（从1开始）
    pub iteration: u32,
    /// 触发本轮修订的质量校验反馈
    pub feedback: String,
    /// 修订时间
    pub revised_at: DateTime<Utc>,
}

/// 研究问题定义
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProblemDefinition {
    /// 核心问题陈述
    pub problem_statement: String,
    /// 主研究问题
    pub main_research_question: String,
    /// 次级研究问题，1-6条
    #[serde(default)]
    pub secondary_questions: Vec<String>,
    /// 关键变量
    #[serde(default)]
    pub key_variables: Vec<String>,
    /// 初步文献
    #[serde(default)]
    pub preliminary_literature: Vec<LiteratureEntry>,
    /// 历次精炼记录
    #[serde(default)]
    pub refinement_history: Vec<RefinementRecord>,
}

impl ProblemDefinition {
    /// 主问题与全部次级问题的集合，用于目标对齐检查
    pub fn all_questions(&self) -> Vec<&str> {
        let mut questions = vec![self.main_research_question.as_str()];
        questions.extend(self.secondary_questions.iter().map(|q| q.as_str()));
        questions
    }
}

impl Validate for ProblemDefinition {
    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.problem_statement.trim().is_empty() {
            errors.push("problem_statement 不能为空".to_string());
        }
        if self.main_research_question.trim().is_empty() {
            errors.push("main_research_question 不能为空".to_string());
        }
        if self.secondary_questions.is_empty() || self.secondary_questions.len() > 6 {
            errors.push(format!(
                "secondary_questions 应包含1-6条，当前为{}条",
                self.secondary_questions.len()
            ));
        }
        for entry in &self.preliminary_literature {
            if reqwest::Url::parse(&entry.url).is_err() {
                errors.push(format!(
                    "preliminary_literature 中存在非法URL: {}",
                    entry.url
                ));
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_problem() -> ProblemDefinition {
        ProblemDefinition {
            problem_statement: "Edge devices cannot train collaboratively without leaking data."
                .to_string(),
            main_research_question: "How can federated learning protect user privacy on edge devices?"
                .to_string(),
            secondary_questions: vec![
                "Which aggregation strategies minimize leakage?".to_string(),
                "What is the accuracy cost of differential privacy?".to_string(),
            ],
            key_variables: vec!["privacy budget".to_string(), "model accuracy".to_string()],
            preliminary_literature: vec![LiteratureEntry {
                title: "Communication-Efficient Learning of Deep Networks".to_string(),
                url: "https://arxiv.org/abs/1602.05629".to_string(),
                relevance_note: "Foundational federated averaging paper".to_string(),
                source: Some("arxiv.org".to_string()),
            }],
            refinement_history: Vec::new(),
        }
    }

    #[test]
    fn test_valid_problem() {
        assert!(sample_problem().validate().is_empty());
    }

    #[test]
    fn test_invalid_literature_url() {
        let mut problem = sample_problem();
        problem.preliminary_literature[0].url = "not a url".to_string();
        let errors = problem.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("非法URL"));
    }

    #[test]
    fn test_secondary_question_bounds() {
        let mut problem = sample_problem();
        problem.secondary_questions.clear();
        assert!(!problem.validate().is_empty());

        problem.secondary_questions = (0..7).map(|i| format!("q{}", i)).collect();
        assert!(!problem.validate().is_empty());
    }

    #[test]
    fn test_all_questions_includes_main() {
        let problem = sample_problem();
        let questions = problem.all_questions();
        assert_eq!(questions.len(), 3);
        assert_eq!(questions[0], problem.main_research_question);
    }
}
