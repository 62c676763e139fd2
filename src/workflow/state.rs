//! 工作流状态机
//!
//! 固定的有向迁移图：唯一的回边是 REFINEMENT -> PROBLEM_FORMULATION，
//! ERROR从任意非终态可达。状态机本身不携带业务数据，只负责合法性
//! 校验与迁移历史的审计记录。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflow::error::WorkflowError;

/// 工作流状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    Init,
    Interviewing,
    ProblemFormulation,
    Objectives,
    Methodology,
    DataCollection,
    QualityControl,
    Refinement,
    Complete,
    Error,
}

impl std::fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl WorkflowState {
    /// 全部状态，用于穷举测试
    pub const ALL: [WorkflowState; 10] = [
        WorkflowState::Init,
        WorkflowState::Interviewing,
        WorkflowState::ProblemFormulation,
        WorkflowState::Objectives,
        WorkflowState::Methodology,
        WorkflowState::DataCollection,
        WorkflowState::QualityControl,
        WorkflowState::Refinement,
        WorkflowState::Complete,
        WorkflowState::Error,
    ];

    /// 状态的机器可读标识
    pub fn key(&self) -> &'static str {
        match self {
            WorkflowState::Init => "init",
            WorkflowState::Interviewing => "interviewing",
            WorkflowState::ProblemFormulation => "problem_formulation",
            WorkflowState::Objectives => "objectives",
            WorkflowState::Methodology => "methodology",
            WorkflowState::DataCollection => "data_collection",
            WorkflowState::QualityControl => "quality_control",
            WorkflowState::Refinement => "refinement",
            WorkflowState::Complete => "complete",
            WorkflowState::Error => "error",
        }
    }

    /// 面向用户的步骤名称
    pub fn step_name(&self) -> &'static str {
        match self {
            WorkflowState::Init => "初始化",
            WorkflowState::Interviewing => "收集用户画像",
            WorkflowState::ProblemFormulation => "定义研究问题",
            WorkflowState::Objectives => "制定研究目标",
            WorkflowState::Methodology => "选择研究方法",
            WorkflowState::DataCollection => "规划数据采集",
            WorkflowState::QualityControl => "校验计划书质量",
            WorkflowState::Refinement => "精炼计划书",
            WorkflowState::Complete => "计划书完成",
            WorkflowState::Error => "发生错误",
        }
    }

    /// 粗粒度的进度百分比
    pub fn progress_percentage(&self) -> f32 {
        match self {
            WorkflowState::Init => 0.0,
            WorkflowState::Interviewing => 10.0,
            WorkflowState::ProblemFormulation => 25.0,
            WorkflowState::Objectives => 40.0,
            WorkflowState::Methodology => 55.0,
            WorkflowState::DataCollection => 70.0,
            WorkflowState::QualityControl => 85.0,
            WorkflowState::Refinement => 90.0,
            WorkflowState::Complete => 100.0,
            WorkflowState::Error => 0.0,
        }
    }

    /// 合法的后继状态集合
    pub fn allowed_successors(&self) -> &'static [WorkflowState] {
        match self {
            WorkflowState::Init => &[WorkflowState::Interviewing, WorkflowState::Error],
            WorkflowState::Interviewing => {
                &[WorkflowState::ProblemFormulation, WorkflowState::Error]
            }
            WorkflowState::ProblemFormulation => {
                &[WorkflowState::Objectives, WorkflowState::Error]
            }
            WorkflowState::Objectives => &[WorkflowState::Methodology, WorkflowState::Error],
            WorkflowState::Methodology => &[WorkflowState::DataCollection, WorkflowState::Error],
            WorkflowState::DataCollection => {
                &[WorkflowState::QualityControl, WorkflowState::Error]
            }
            WorkflowState::QualityControl => &[
                WorkflowState::Complete,
                WorkflowState::Refinement,
                WorkflowState::Error,
            ],
            WorkflowState::Refinement => {
                &[WorkflowState::ProblemFormulation, WorkflowState::Error]
            }
            WorkflowState::Complete => &[],
            WorkflowState::Error => &[],
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.allowed_successors().is_empty()
    }
}

/// 一次状态迁移的审计记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition {
    pub from_state: WorkflowState,
    pub to_state: WorkflowState,
    pub timestamp: DateTime<Utc>,
}

/// 状态机
#[derive(Debug)]
pub struct StateMachine {
    current: WorkflowState,
    history: Vec<StateTransition>,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            current: WorkflowState::Init,
            history: Vec::new(),
        }
    }

    pub fn current(&self) -> WorkflowState {
        self.current
    }

    /// 迁移到目标状态，非法迁移返回IllegalTransition
    pub fn advance(&mut self, target: WorkflowState) -> Result<(), WorkflowError> {
        if !self.current.allowed_successors().contains(&target) {
            return Err(WorkflowError::IllegalTransition {
                from: self.current,
                to: target,
            });
        }

        self.record(target);
        Ok(())
    }

    /// 运维复位：仅允许从ERROR回到INIT，同样记录迁移历史
    pub fn reset(&mut self) -> Result<(), WorkflowError> {
        if self.current != WorkflowState::Error {
            return Err(WorkflowError::IllegalTransition {
                from: self.current,
                to: WorkflowState::Init,
            });
        }

        self.record(WorkflowState::Init);
        Ok(())
    }

    /// 迁移历史，按发生顺序原样返回
    pub fn history(&self) -> &[StateTransition] {
        &self.history
    }

    fn record(&mut self, target: WorkflowState) {
        self.history.push(StateTransition {
            from_state: self.current,
            to_state: target,
            timestamp: Utc::now(),
        });
        self.current = target;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exhaustive_transition_table() {
        // 对全部状态对穷举：表内合法迁移成功，表外一律IllegalTransition
        for from in WorkflowState::ALL {
            for to in WorkflowState::ALL {
                let mut machine = StateMachine {
                    current: from,
                    history: Vec::new(),
                };
                let result = machine.advance(to);

                if from.allowed_successors().contains(&to) {
                    assert!(result.is_ok(), "{} -> {} 应当合法", from, to);
                    assert_eq!(machine.current(), to);
                } else {
                    assert!(
                        matches!(result, Err(WorkflowError::IllegalTransition { .. })),
                        "{} -> {} 应当非法",
                        from,
                        to
                    );
                    assert_eq!(machine.current(), from);
                }
            }
        }
    }

    #[test]
    fn test_refinement_back_edge_is_only_loop() {
        // 除ERROR外，唯一指向更早阶段的迁移是 REFINEMENT -> PROBLEM_FORMULATION
        let successors = WorkflowState::Refinement.allowed_successors();
        assert!(successors.contains(&WorkflowState::ProblemFormulation));
    }

    #[test]
    fn test_error_reachable_from_all_non_terminal_states() {
        for state in WorkflowState::ALL {
            if state.is_terminal() {
                continue;
            }
            assert!(
                state.allowed_successors().contains(&WorkflowState::Error),
                "{} 应当可迁移到 ERROR",
                state
            );
        }
    }

    #[test]
    fn test_terminal_states() {
        assert!(WorkflowState::Complete.is_terminal());
        assert!(WorkflowState::Error.is_terminal());
        for state in WorkflowState::ALL {
            if state != WorkflowState::Complete && state != WorkflowState::Error {
                assert!(!state.is_terminal());
            }
        }
    }

    #[test]
    fn test_history_records_full_path() {
        let mut machine = StateMachine::new();
        machine.advance(WorkflowState::Interviewing).unwrap();
        machine.advance(WorkflowState::ProblemFormulation).unwrap();
        machine.advance(WorkflowState::Objectives).unwrap();

        let history = machine.history();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].from_state, WorkflowState::Init);
        assert_eq!(history[0].to_state, WorkflowState::Interviewing);
        assert_eq!(history[2].to_state, WorkflowState::Objectives);
    }

    #[test]
    fn test_reset_only_from_error() {
        let mut machine = StateMachine::new();
        assert!(machine.reset().is_err());

        machine.advance(WorkflowState::Error).unwrap();
        machine.reset().unwrap();
        assert_eq!(machine.current(), WorkflowState::Init);

        // 复位后可以正常重新开跑
        machine.advance(WorkflowState::Interviewing).unwrap();
    }

    #[test]
    fn test_complete_is_dead_end() {
        let mut machine = StateMachine::new();
        machine.advance(WorkflowState::Interviewing).unwrap();
        machine.advance(WorkflowState::ProblemFormulation).unwrap();
        machine.advance(WorkflowState::Objectives).unwrap();
        machine.advance(WorkflowState::Methodology).unwrap();
        machine.advance(WorkflowState::DataCollection).unwrap();
        machine.advance(WorkflowState::QualityControl).unwrap();
        machine.advance(WorkflowState::Complete).unwrap();

        for target in WorkflowState::ALL {
            assert!(machine.advance(target).is_err());
        }
    }

    #[test]
    fn test_state_keys_are_snake_case() {
        assert_eq!(WorkflowState::ProblemFormulation.key(), "problem_formulation");
        let serialized = serde_json::to_string(&WorkflowState::DataCollection).unwrap();
        assert_eq!(serialized, "\"data_collection\"");
    }
}
