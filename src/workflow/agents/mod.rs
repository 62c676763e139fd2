// 流水线阶段智能体
//
// 每个智能体只声明自己的输出类型、输入依赖与Prompt模板，
// 执行统一由StageRunner完成：
//   ProblemFormulation  = 用户画像 (+文献检索工具)
//   Objectives          = 画像 + 问题定义
//   Methodology         = 画像 + 问题定义 + 目标
//   DataCollection      = 画像 + 目标 + 方法论
//   QualityControl      = 以上全部产物

pub mod data_collection;
pub mod methodology;
pub mod objectives;
pub mod problem_formulation;
pub mod quality_control;

pub use data_collection::DataCollectionAgent;
pub use methodology::MethodologyAgent;
pub use objectives::ObjectivesAgent;
pub use problem_formulation::ProblemFormulationAgent;
pub use quality_control::QualityControlAgent;
