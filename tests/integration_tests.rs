use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use scholargen_rs::config::Config;
use scholargen_rs::interview::{AnswerOutcome, InterviewSession};
use scholargen_rs::llm::invoker::{InvokeError, InvokeRequest, LanguageModel};
use scholargen_rs::store::{ArtifactStore, FileArtifactStore};
use scholargen_rs::types::{TimeSpan, TimeUnit, UserProfile};
use scholargen_rs::workflow::{ProposalOrchestrator, RunStatus};

/// 按脚本顺序吐出响应的模型替身
struct ScriptedModel {
    responses: Mutex<VecDeque<Result<String, InvokeError>>>,
    calls: Mutex<usize>,
    cancel_on_call: Option<(usize, CancellationToken)>,
}

impl ScriptedModel {
    fn new(responses: Vec<Result<String, InvokeError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(0),
            cancel_on_call: None,
        }
    }

    fn with_cancel_on_call(mut self, call: usize, token: CancellationToken) -> Self {
        self.cancel_on_call = Some((call, token));
        self
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn invoke(&self, _request: InvokeRequest) -> Result<String, InvokeError> {
        let call_index = {
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            *calls
        };

        if let Some((call, token)) = &self.cancel_on_call
            && call_index == *call
        {
            token.cancel();
        }

        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(InvokeError::Permanent("脚本响应耗尽".to_string())))
    }
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.snapshot.enabled = false;
    config.llm.retry_attempts = 3;
    config.llm.retry_delay_ms = 1;
    config
}

/// 通过访谈状态机产出用户画像
fn interviewed_profile() -> UserProfile {
    let mut session = InterviewSession::new();
    let answers = [
        "Master's",
        "Computer Science",
        "Federated learning on edge devices",
        "10",
        "6 months",
        "Python, Statistics",
        "Distributed systems",
        "remote only",
        "Part-time student",
    ];
    for answer in answers {
        assert_eq!(
            session.submit_answer(answer).unwrap(),
            AnswerOutcome::Accepted
        );
    }
    session.finish().unwrap()
}

fn problem_json() -> Value {
    json!({
        "problem_statement": "Edge devices cannot collaborate without privacy leakage.",
        "main_research_question": "MQ",
        "secondary_questions": ["SQ1", "SQ2"],
        "key_variables": ["privacy budget"],
        "preliminary_literature": [{
            "title": "Federated averaging",
            "url": "https://arxiv.org/abs/1602.05629",
            "relevance_note": "foundational",
            "source": "arxiv.org"
        }],
        "refinement_history": []
    })
}

fn objectives_json() -> Value {
    json!({
        "general_objective": "Evaluate privacy-preserving federated learning",
        "specific_objectives": ["O1", "O2", "O3"],
        "feasibility_notes": {
            "timeline_assessment": "fits",
            "required_skills": ["Python"],
            "risk_factors": []
        },
        "alignment": {
            "question_to_objectives": {"MQ": ["O1"], "SQ1": ["O2"], "SQ2": ["O3"]},
            "coherence_rating": 0.9
        }
    })
}

fn methodology_json() -> Value {
    json!({
        "recommended_methodology": "Controlled experiments",
        "methodology_type": "quantitative",
        "justification": "Measurable research questions",
        "required_skills": ["statistics"],
        "timeline_fit": {
            "feasible": true,
            "estimated_duration": "10 weeks",
            "phase_breakdown": [],
            "risks": []
        },
        "alternative_methodologies": []
    })
}

fn plan_json(preparation: u32, collection: u32, quality_check: u32) -> Value {
    json!({
        "collection_techniques": ["benchmark experiments"],
        "recommended_tools": [],
        "data_sources": ["public datasets"],
        "estimated_sample_size": "5 datasets",
        "timeline_breakdown": {
            "preparation": {"value": preparation, "unit": "weeks"},
            "collection": {"value": collection, "unit": "weeks"},
            "quality_check": {"value": quality_check, "unit": "weeks"}
        },
        "resource_requirements": []
    })
}

fn quality_pass_json() -> Value {
    json!({
        "validation_passed": true,
        "coherence_score": 0.9,
        "feasibility_score": 0.85,
        "overall_quality_score": 88.0,
        "issues_identified": [],
        "recommendations": [],
        "requires_refinement": false,
        "refinement_targets": []
    })
}

fn quality_refine_json() -> Value {
    json!({
        "validation_passed": false,
        "coherence_score": 0.5,
        "feasibility_score": 0.6,
        "overall_quality_score": 55.0,
        "issues_identified": [{
            "severity": "major",
            "component": "problem_definition",
            "description": "Scope too broad",
            "impact": "Objectives cannot all be met"
        }],
        "recommendations": ["Narrow the problem scope"],
        "requires_refinement": true,
        "refinement_targets": ["problem_definition"]
    })
}

fn ok(value: Value) -> Result<String, InvokeError> {
    Ok(value.to_string())
}

fn cycle_responses(quality: Value) -> Vec<Result<String, InvokeError>> {
    vec![
        ok(problem_json()),
        ok(objectives_json()),
        ok(methodology_json()),
        ok(plan_json(2, 6, 2)),
        ok(quality),
    ]
}

#[tokio::test]
async fn test_interview_to_completed_proposal_with_snapshots() {
    let temp_dir = TempDir::new().unwrap();
    let profile = interviewed_profile();

    let model = Arc::new(ScriptedModel::new(cycle_responses(quality_pass_json())));
    let store = Arc::new(FileArtifactStore::new(temp_dir.path().to_path_buf()));
    let orchestrator =
        ProposalOrchestrator::with_model(test_config(), model).with_store(store.clone());

    let result = orchestrator.run(profile).await;

    assert!(result.success);
    assert_eq!(result.status, RunStatus::Completed);
    assert!(result.metadata.alignment_gaps.is_empty());
    assert_eq!(result.artifacts.len(), 6);

    // 每个阶段产物都有落盘快照
    for stage in [
        "user_profile",
        "problem_definition",
        "research_objectives",
        "methodology",
        "data_collection_plan",
        "quality_validation",
    ] {
        let snapshot = store
            .load_latest(&result.metadata.run_id, stage)
            .await
            .unwrap();
        assert!(snapshot.is_some(), "缺少 {} 的快照", stage);
    }
}

#[tokio::test]
async fn test_refinement_keeps_all_problem_revisions_on_disk() {
    let temp_dir = TempDir::new().unwrap();

    let mut responses = Vec::new();
    for _ in 0..3 {
        responses.extend(cycle_responses(quality_refine_json()));
    }

    let model = Arc::new(ScriptedModel::new(responses));
    let store = Arc::new(FileArtifactStore::new(temp_dir.path().to_path_buf()));
    let orchestrator =
        ProposalOrchestrator::with_model(test_config(), model).with_store(store.clone());

    let result = orchestrator.run(interviewed_profile()).await;

    assert_eq!(result.status, RunStatus::CompletedWithWarnings);
    assert!(result.metadata.forced_completion);
    assert_eq!(result.metadata.refinement_iterations, 2);

    // 初版 + 2次精炼 = 3份问题定义快照
    let snapshot_files: Vec<String> = std::fs::read_dir(temp_dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
        .filter(|name| name.contains("problem_definition"))
        .collect();
    assert_eq!(snapshot_files.len(), 3);

    // 最新快照的修订历史包含两轮反馈
    let latest = store
        .load_latest(&result.metadata.run_id, "problem_definition")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(latest["refinement_history"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_overcommitted_timeline_fails_validation() {
    // 每周5小时、总共3个月的画像，配上16周的采集计划：必须判不通过
    let mut profile = interviewed_profile();
    profile.weekly_hours = 5;
    profile.total_timeline = TimeSpan::new(3, TimeUnit::Months);

    let mut config = test_config();
    config.workflow.max_refinements = 0;

    let responses = vec![
        ok(problem_json()),
        ok(objectives_json()),
        ok(methodology_json()),
        ok(plan_json(4, 10, 2)),
        ok(quality_pass_json()),
    ];
    let model = Arc::new(ScriptedModel::new(responses));
    let orchestrator = ProposalOrchestrator::with_model(config, model);

    let result = orchestrator.run(profile).await;

    assert!(!result.metadata.validation_passed);
    let quality = &result.artifacts["quality_validation"];
    assert_eq!(quality["validation_passed"], false);

    let issues = quality["issues_identified"].as_array().unwrap();
    assert!(
        issues
            .iter()
            .any(|issue| issue["description"].as_str().unwrap().contains("超出总时间预算"))
    );
}

#[tokio::test]
async fn test_cancellation_keeps_only_finished_stages() {
    let token = CancellationToken::new();
    let responses = vec![ok(problem_json()), ok(objectives_json())];
    let model = Arc::new(ScriptedModel::new(responses).with_cancel_on_call(2, token.clone()));
    let orchestrator =
        ProposalOrchestrator::with_model(test_config(), model).with_cancellation(token);

    let result = orchestrator.run(interviewed_profile()).await;

    assert_eq!(result.status, RunStatus::Cancelled);
    assert!(!result.success);
    assert!(result.artifacts.contains_key("problem_definition"));
    assert!(result.artifacts.contains_key("research_objectives"));
    assert!(!result.artifacts.contains_key("methodology"));
    assert!(!result.artifacts.contains_key("data_collection_plan"));
}

#[tokio::test]
async fn test_failure_is_structured_not_panic() {
    let responses = vec![
        ok(problem_json()),
        Err(InvokeError::Permanent("400 malformed request".to_string())),
    ];
    let model = Arc::new(ScriptedModel::new(responses));
    let orchestrator = ProposalOrchestrator::with_model(test_config(), model);

    let result = orchestrator.run(interviewed_profile()).await;

    assert!(!result.success);
    assert_eq!(result.status, RunStatus::Failed);

    let error = result.error.unwrap();
    assert_eq!(error.stage, "objectives");
    assert_eq!(error.kind, "permanent");
    assert!(error.message.contains("400"));

    // 已完成阶段的产物保留在结果中
    assert!(result.artifacts.contains_key("problem_definition"));
}
