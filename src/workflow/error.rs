//! 工作流错误分级

use serde::{Deserialize, Serialize};

use crate::llm::extractor::ExtractionError;
use crate::workflow::state::WorkflowState;

/// 状态机层错误
///
/// 非法迁移属于编排层的程序缺陷，对本次运行总是致命的，绝不重试。
#[derive(Debug, Clone, thiserror::Error)]
pub enum WorkflowError {
    #[error("非法状态迁移: {from} -> {to}")]
    IllegalTransition {
        from: WorkflowState,
        to: WorkflowState,
    },
}

/// 阶段执行错误的具体分类
#[derive(Debug, Clone, thiserror::Error)]
pub enum StageErrorKind {
    /// 声明的必需输入产物缺失
    #[error("缺少必需的输入产物: {0}")]
    MissingInput(String),
    /// 瞬态错误重试预算耗尽
    #[error("瞬态错误重试预算耗尽: {0}")]
    RetriesExhausted(String),
    /// 永久性模型调用失败
    #[error("永久性调用失败: {0}")]
    Permanent(String),
    /// 纠偏重问后仍无法提取出合规产物
    #[error("结构化提取失败: {0}")]
    Extraction(#[from] ExtractionError),
}

/// 单个阶段的终态错误，会把整个运行带入ERROR状态
#[derive(Debug, Clone, thiserror::Error)]
#[error("阶段 {stage} 执行失败: {kind}")]
pub struct StageError {
    pub stage: WorkflowState,
    pub kind: StageErrorKind,
}

impl StageError {
    pub fn new(stage: WorkflowState, kind: StageErrorKind) -> Self {
        Self { stage, kind }
    }
}

/// 附着在运行结果上的错误描述，供调用方决定续跑、重跑或放弃
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDescriptor {
    /// 出错的阶段名
    pub stage: String,
    /// 错误类别标识
    pub kind: String,
    /// 底层错误信息
    pub message: String,
}

impl From<&StageError> for ErrorDescriptor {
    fn from(err: &StageError) -> Self {
        let kind = match &err.kind {
            StageErrorKind::MissingInput(_) => "missing_input",
            StageErrorKind::RetriesExhausted(_) => "retries_exhausted",
            StageErrorKind::Permanent(_) => "permanent",
            StageErrorKind::Extraction(ExtractionError::Unparseable { .. }) => {
                "extraction_unparseable"
            }
            StageErrorKind::Extraction(ExtractionError::SchemaViolation { .. }) => {
                "extraction_schema_violation"
            }
        };

        Self {
            stage: err.stage.key().to_string(),
            kind: kind.to_string(),
            message: err.kind.to_string(),
        }
    }
}

impl From<&WorkflowError> for ErrorDescriptor {
    fn from(err: &WorkflowError) -> Self {
        let WorkflowError::IllegalTransition { from, .. } = err;
        Self {
            stage: from.key().to_string(),
            kind: "illegal_transition".to_string(),
            message: err.to_string(),
        }
    }
}
