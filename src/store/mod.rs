//! 产物快照存储 - 每个阶段产物落盘一份，供事后复盘与断点恢复

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use tokio::fs;

/// 快照文件内容
#[derive(Debug, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub run_id: String,
    pub stage: String,
    /// 第几轮精炼产生的版本（0为首轮）
    pub iteration: u32,
    pub saved_at: String,
    pub data: Value,
}

/// 产物存储接口
///
/// 核心在没有持久化诉求时使用NullArtifactStore即可正常工作；存储失败
/// 由调用方降级为警告，不会中断运行。
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn save(&self, run_id: &str, stage: &str, iteration: u32, artifact: &Value)
    -> Result<()>;

    async fn load_latest(&self, run_id: &str, stage: &str) -> Result<Option<Value>>;
}

/// 空实现 - 不做任何持久化
#[derive(Debug, Default, Clone)]
pub struct NullArtifactStore;

#[async_trait]
impl ArtifactStore for NullArtifactStore {
    async fn save(
        &self,
        _run_id: &str,
        _stage: &str,
        _iteration: u32,
        _artifact: &Value,
    ) -> Result<()> {
        Ok(())
    }

    async fn load_latest(&self, _run_id: &str, _stage: &str) -> Result<Option<Value>> {
        Ok(None)
    }
}

/// 文件快照存储
///
/// 文件名形如 `{run_id}_iter{iteration}_{stage}.json`，同一阶段的更高
/// iteration视为更新版本。
#[derive(Debug, Clone)]
pub struct FileArtifactStore {
    snapshot_dir: PathBuf,
}

impl FileArtifactStore {
    pub fn new(snapshot_dir: PathBuf) -> Self {
        Self { snapshot_dir }
    }

    fn snapshot_path(&self, run_id: &str, stage: &str, iteration: u32) -> PathBuf {
        self.snapshot_dir
            .join(format!("{}_iter{}_{}.json", run_id, iteration, stage))
    }
}

#[async_trait]
impl ArtifactStore for FileArtifactStore {
    async fn save(
        &self,
        run_id: &str,
        stage: &str,
        iteration: u32,
        artifact: &Value,
    ) -> Result<()> {
        fs::create_dir_all(&self.snapshot_dir)
            .await
            .context("Failed to create snapshot directory")?;

        let entry = SnapshotEntry {
            run_id: run_id.to_string(),
            stage: stage.to_string(),
            iteration,
            saved_at: Utc::now().to_rfc3339(),
            data: artifact.clone(),
        };

        let path = self.snapshot_path(run_id, stage, iteration);
        let content = serde_json::to_string_pretty(&entry)?;
        fs::write(&path, content)
            .await
            .context(format!("Failed to write snapshot: {:?}", path))?;

        Ok(())
    }

    async fn load_latest(&self, run_id: &str, stage: &str) -> Result<Option<Value>> {
        let mut latest: Option<(u32, Value)> = None;

        let mut dir = match fs::read_dir(&self.snapshot_dir).await {
            Ok(dir) => dir,
            Err(_) => return Ok(None),
        };

        let suffix = format!("_{}.json", stage);
        let prefix = format!("{}_iter", run_id);

        while let Some(entry) = dir.next_entry().await? {
            let file_name = entry.file_name().to_string_lossy().to_string();
            let Some(rest) = file_name.strip_prefix(&prefix) else {
                continue;
            };
            let Some(iteration_text) = rest.strip_suffix(&suffix) else {
                continue;
            };
            let Ok(iteration) = iteration_text.parse::<u32>() else {
                continue;
            };

            if latest.as_ref().is_none_or(|(best, _)| iteration >= *best) {
                let content = fs::read_to_string(entry.path()).await?;
                let snapshot: SnapshotEntry = serde_json::from_str(&content)
                    .context(format!("Corrupt snapshot file: {}", file_name))?;
                latest = Some((iteration, snapshot.data));
            }
        }

        Ok(latest.map(|(_, data)| data))
    }
}
