//! 访谈状态机 - 逐题收集信息并产出UserProfile
//!
//! 这是工作流核心之外的一个独立小状态机：维护问题游标与答案映射，
//! 答案校验不通过时停在原题并给出澄清提示，全部完成后组装用户画像
//! 作为流水线的入口输入。

use anyhow::{Context, Result, anyhow};
use std::collections::HashMap;

use crate::types::{TimeSpan, UserProfile, Validate};

/// 答案的期望形态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerKind {
    /// 任意非空文本
    FreeText,
    /// 正整数
    PositiveInt,
    /// "6 months" 形式的时间跨度
    Timeline,
    /// 逗号分隔的列表，"none"视为空
    List,
    /// 可留空的补充说明
    OptionalText,
}

/// 单个访谈问题
#[derive(Debug, Clone)]
pub struct InterviewQuestion {
    pub id: &'static str,
    pub text: &'static str,
    pub kind: AnswerKind,
    pub clarification: &'static str,
}

/// 固定的问卷题目
pub const QUESTIONS: &[InterviewQuestion] = &[
    InterviewQuestion {
        id: "academic_program",
        text: "What is your current academic program (e.g., Bachelor's, Master's, PhD)?",
        kind: AnswerKind::FreeText,
        clarification: "Please name your academic program.",
    },
    InterviewQuestion {
        id: "field_of_study",
        text: "What is your general field of study?",
        kind: AnswerKind::FreeText,
        clarification: "Please name your field of study.",
    },
    InterviewQuestion {
        id: "research_area",
        text: "What is your specific research area of interest?",
        kind: AnswerKind::FreeText,
        clarification: "Please describe your research area.",
    },
    InterviewQuestion {
        id: "weekly_hours",
        text: "How many hours per week can you dedicate to this research?",
        kind: AnswerKind::PositiveInt,
        clarification: "Please provide a valid number of hours (e.g., 10, 20).",
    },
    InterviewQuestion {
        id: "total_timeline",
        text: "What is your total timeline for this project (e.g., 6 months, 1 year)?",
        kind: AnswerKind::Timeline,
        clarification: "Please provide a duration like '6 months' or '1 year'.",
    },
    InterviewQuestion {
        id: "existing_skills",
        text: "What relevant skills do you currently possess (e.g., Python, Statistics)?",
        kind: AnswerKind::List,
        clarification: "Please list skills separated by commas, or answer 'none'.",
    },
    InterviewQuestion {
        id: "missing_skills",
        text: "Are there any specific skills you are looking to develop or currently lack?",
        kind: AnswerKind::List,
        clarification: "Please list skills separated by commas, or answer 'none'.",
    },
    InterviewQuestion {
        id: "constraints",
        text: "Do you have any specific constraints (e.g., no fieldwork, remote only)?",
        kind: AnswerKind::List,
        clarification: "Please list constraints separated by commas, or answer 'none'.",
    },
    InterviewQuestion {
        id: "additional_context",
        text: "Is there any other context or information you'd like to share?",
        kind: AnswerKind::OptionalText,
        clarification: "",
    },
];

/// 一次答案提交的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// 答案被接受，游标前进
    Accepted,
    /// 答案未通过校验，停留在当前问题并提示澄清
    NeedsClarification(&'static str),
}

/// 访谈会话状态
#[derive(Debug, Default)]
pub struct InterviewSession {
    index: usize,
    answers: HashMap<&'static str, String>,
    complete: bool,
}

impl InterviewSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前待回答的问题，访谈完成后返回None
    pub fn current_question(&self) -> Option<&'static InterviewQuestion> {
        QUESTIONS.get(self.index)
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// 访谈进度（0-1）
    pub fn progress(&self) -> f32 {
        self.index as f32 / QUESTIONS.len() as f32
    }

    /// 提交当前问题的答案
    pub fn submit_answer(&mut self, answer: &str) -> Result<AnswerOutcome> {
        let question = self
            .current_question()
            .ok_or_else(|| anyhow!("访谈已完成，无待回答的问题"))?;

        let trimmed = answer.trim();
        let valid = match question.kind {
            AnswerKind::FreeText => !trimmed.is_empty(),
            AnswerKind::PositiveInt => trimmed.parse::<u32>().is_ok_and(|v| v > 0),
            AnswerKind::Timeline => TimeSpan::parse(trimmed).is_ok(),
            AnswerKind::List => !trimmed.is_empty(),
            AnswerKind::OptionalText => true,
        };

        if !valid {
            return Ok(AnswerOutcome::NeedsClarification(question.clarification));
        }

        self.answers.insert(question.id, trimmed.to_string());
        self.index += 1;
        if self.index == QUESTIONS.len() {
            self.complete = true;
        }

        Ok(AnswerOutcome::Accepted)
    }

    /// 组装用户画像；仅在访谈完成后可用
    pub fn finish(&self) -> Result<UserProfile> {
        if !self.complete {
            return Err(anyhow!(
                "访谈尚未完成（{}/{}题）",
                self.index,
                QUESTIONS.len()
            ));
        }

        let answer = |id: &str| -> Result<&String> {
            self.answers
                .get(id)
                .ok_or_else(|| anyhow!("缺少问题 {} 的答案", id))
        };

        let weekly_hours: u32 = answer("weekly_hours")?
            .parse()
            .context("weekly_hours 无法解析为正整数")?;
        let total_timeline = TimeSpan::parse(answer("total_timeline")?)?;

        let additional_context = {
            let text = answer("additional_context")?.clone();
            if text.is_empty() { None } else { Some(text) }
        };

        let profile = UserProfile {
            academic_program: answer("academic_program")?.clone(),
            field_of_study: answer("field_of_study")?.clone(),
            research_area: answer("research_area")?.clone(),
            weekly_hours,
            total_timeline,
            existing_skills: parse_list(answer("existing_skills")?),
            missing_skills: parse_list(answer("missing_skills")?),
            constraints: parse_list(answer("constraints")?),
            additional_context,
        };

        let errors = profile.validate();
        if !errors.is_empty() {
            return Err(anyhow!("访谈产出的画像未通过校验: {}", errors.join("; ")));
        }

        Ok(profile)
    }
}

/// 把逗号分隔的自由文本拆成列表，"none"等否定回答视为空列表
fn parse_list(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    if matches!(lowered.as_str(), "none" | "no" | "n/a" | "无") {
        return Vec::new();
    }

    text.split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}
