use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::Config;
use crate::llm::LanguageModel;
use crate::memory::Memory;
use crate::store::ArtifactStore;
use crate::workflow::progress::ProgressSink;
use crate::workflow::state::WorkflowState;

/// Memory作用域
pub struct MemoryScope;

impl MemoryScope {
    pub const ARTIFACTS: &'static str = "artifacts";
}

/// 各阶段产物在Memory与运行结果中的键
pub struct ArtifactKeys;

impl ArtifactKeys {
    pub const USER_PROFILE: &'static str = "user_profile";
    pub const PROBLEM_DEFINITION: &'static str = "problem_definition";
    pub const RESEARCH_OBJECTIVES: &'static str = "research_objectives";
    pub const METHODOLOGY: &'static str = "methodology";
    pub const DATA_COLLECTION_PLAN: &'static str = "data_collection_plan";
    pub const QUALITY_VALIDATION: &'static str = "quality_validation";

    pub const ALL: [&'static str; 6] = [
        Self::USER_PROFILE,
        Self::PROBLEM_DEFINITION,
        Self::RESEARCH_OBJECTIVES,
        Self::METHODOLOGY,
        Self::DATA_COLLECTION_PLAN,
        Self::QUALITY_VALIDATION,
    ];
}

/// 单次运行的上下文
///
/// 每次run独占一份：产物记忆与取消令牌互不共享，多条并发运行之间唯一
/// 共享的是模型调用器内部的并发预算信号量。
#[derive(Clone)]
pub struct RunContext {
    /// 运行标识
    pub run_id: String,
    /// 配置
    pub config: Config,
    /// 模型调用器
    pub model: Arc<dyn LanguageModel>,
    /// 运行期产物记忆
    pub memory: Arc<RwLock<Memory>>,
    /// 产物快照存储
    pub store: Arc<dyn ArtifactStore>,
    /// 进度接收端
    pub progress: Arc<dyn ProgressSink>,
    /// 协作式取消令牌，阶段之间检查
    pub cancellation: CancellationToken,
}

impl RunContext {
    pub fn new(
        config: Config,
        model: Arc<dyn LanguageModel>,
        store: Arc<dyn ArtifactStore>,
        progress: Arc<dyn ProgressSink>,
        cancellation: CancellationToken,
    ) -> Self {
        let run_id = config.run_label_or(&Uuid::new_v4().to_string());

        Self {
            run_id,
            config,
            model,
            memory: Arc::new(RwLock::new(Memory::new())),
            store,
            progress,
            cancellation,
        }
    }

    /// 持久化一个阶段产物：记忆中追加修订，并尽力写入快照存储
    ///
    /// 快照失败只降级为警告，产物仍保留在记忆中，不中断运行。
    pub async fn persist_artifact<T>(&self, key: &str, artifact: &T, iteration: u32)
    where
        T: Serialize,
    {
        if let Err(e) = self
            .memory
            .write()
            .await
            .store(MemoryScope::ARTIFACTS, key, artifact)
        {
            eprintln!("⚠️ 产物写入记忆失败 [{}]: {}", key, e);
            return;
        }

        match serde_json::to_value(artifact) {
            Ok(value) => {
                if let Err(e) = self.store.save(&self.run_id, key, iteration, &value).await {
                    eprintln!("⚠️ 产物快照保存失败 [{}]: {}", key, e);
                }
            }
            Err(e) => eprintln!("⚠️ 产物序列化失败 [{}]: {}", key, e),
        }
    }

    /// 获取指定产物的最新修订
    pub async fn get_artifact<T>(&self, key: &str) -> Option<T>
    where
        T: for<'a> Deserialize<'a>,
    {
        self.memory.write().await.get(MemoryScope::ARTIFACTS, key)
    }

    /// 检查指定产物是否存在
    pub async fn has_artifact(&self, key: &str) -> bool {
        self.memory.read().await.has_data(MemoryScope::ARTIFACTS, key)
    }

    /// 当前全部产物的最新修订快照（仅包含已产出的阶段）
    pub async fn artifacts_snapshot(&self) -> HashMap<String, Value> {
        let memory = self.memory.read().await;
        let mut snapshot = HashMap::new();

        for key in ArtifactKeys::ALL {
            if let Some(value) = memory.latest_value(MemoryScope::ARTIFACTS, key) {
                snapshot.insert(key.to_string(), value);
            }
        }

        snapshot
    }

    /// 上报阶段进度
    pub fn report_progress(&self, state: WorkflowState) {
        let percent = state.progress_percentage();
        self.progress.emit(state.key(), percent);

        if self.config.verbose {
            println!("📍 {} ({:.0}%)", state.step_name(), percent);
        }
    }
}
