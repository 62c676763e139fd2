pub mod data_collection;
pub mod methodology;
pub mod objectives;
pub mod problem;
pub mod profile;
pub mod quality;
pub mod timeline;

pub use data_collection::{DataCollectionPlan, PhasedTimeline, RecommendedTool};
pub use methodology::{
    AlternativeMethodology, MethodologyRecommendation, MethodologyType, TimelineFit,
};
pub use objectives::{AlignmentCheck, FeasibilityNotes, ResearchObjectives};
pub use problem::{LiteratureEntry, ProblemDefinition, RefinementRecord};
pub use profile::UserProfile;
pub use quality::{IssueSeverity, QualityValidation, ValidationIssue};
pub use timeline::{TimeSpan, TimeUnit};

/// 产物级校验 - 返回具体的字段违规描述，空列表代表通过
///
/// 解析成功只说明JSON形态正确，这里负责把领域约束（条目数量、取值范围、
/// URL合法性等）显式检查出来，违规信息将被逐条回传给模型做纠偏。
pub trait Validate {
    fn validate(&self) -> Vec<String>;
}
