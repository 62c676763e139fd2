use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use crate::i18n::TargetLanguage;

/// LLM Provider类型
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub enum LLMProvider {
    #[serde(rename = "openai")]
    #[default]
    OpenAI,
    #[serde(rename = "deepseek")]
    DeepSeek,
    #[serde(rename = "anthropic")]
    Anthropic,
    #[serde(rename = "gemini")]
    Gemini,
    #[serde(rename = "ollama")]
    Ollama,
}

impl std::fmt::Display for LLMProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LLMProvider::OpenAI => write!(f, "openai"),
            LLMProvider::DeepSeek => write!(f, "deepseek"),
            LLMProvider::Anthropic => write!(f, "anthropic"),
            LLMProvider::Gemini => write!(f, "gemini"),
            LLMProvider::Ollama => write!(f, "ollama"),
        }
    }
}

impl std::str::FromStr for LLMProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(LLMProvider::OpenAI),
            "deepseek" => Ok(LLMProvider::DeepSeek),
            "anthropic" => Ok(LLMProvider::Anthropic),
            "gemini" => Ok(LLMProvider::Gemini),
            "ollama" => Ok(LLMProvider::Ollama),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

/// 应用程序配置
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// 本次运行的标签，用于快照文件命名；为空时使用run_id
    pub run_label: Option<String>,

    /// 内部工作目录路径 (.scholargen)
    pub internal_path: PathBuf,

    /// 计划书的目标语言
    pub target_language: TargetLanguage,

    /// LLM模型配置
    pub llm: LLMConfig,

    /// 工作流配置
    pub workflow: WorkflowConfig,

    /// 快照配置
    pub snapshot: SnapshotConfig,

    /// 是否启用详细日志
    pub verbose: bool,
}

/// LLM模型配置
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LLMConfig {
    /// LLM Provider类型
    pub provider: LLMProvider,

    /// LLM API KEY
    pub api_key: String,

    /// LLM API基地址
    pub api_base_url: String,

    /// 高能效模型，优先用于常规的起草与校验任务
    pub model_efficient: String,

    /// 高质量模型，用于超长上下文的推理任务
    pub model_powerful: String,

    /// 最大tokens
    pub max_tokens: u32,

    /// 温度
    pub temperature: f64,

    /// 瞬态错误的最大重试次数
    pub retry_attempts: u32,

    /// 首次重试的基础间隔（毫秒），之后按指数退避
    pub retry_delay_ms: u64,

    /// 超时时间（秒）
    pub timeout_seconds: u64,

    /// 禁用文献检索工具（问题定义阶段将不再附带检索能力）
    pub disable_search_tool: bool,

    /// 全进程范围内允许的最大并发模型调用数
    pub max_parallels: usize,
}

/// 工作流配置
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WorkflowConfig {
    /// 质量校验失败后允许的最大精炼轮数
    pub max_refinements: u32,

    /// 提取失败后允许的最大纠偏重问次数
    pub max_repair_prompts: u32,

    /// 总体质量分的通过阈值（0-100）
    pub pass_threshold: f64,
}

/// 快照配置
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SnapshotConfig {
    /// 是否启用文件快照
    pub enabled: bool,

    /// 快照目录
    pub snapshot_dir: PathBuf,
}

impl Config {
    /// 从文件加载配置
    pub fn from_file(path: &PathBuf) -> Result<Self> {
        let mut file =
            File::open(path).context(format!("Failed to open config file: {:?}", path))?;
        let mut content = String::new();
        file.read_to_string(&mut content)
            .context("Failed to read config file")?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// 获取本次运行的标签，未配置时回退到指定的默认值
    pub fn run_label_or(&self, fallback: &str) -> String {
        match &self.run_label {
            Some(label) if !label.trim().is_empty() => label.clone(),
            _ => fallback.to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            run_label: None,
            internal_path: PathBuf::from("./.scholargen"),
            target_language: TargetLanguage::default(),
            llm: LLMConfig::default(),
            workflow: WorkflowConfig::default(),
            snapshot: SnapshotConfig::default(),
            verbose: false,
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: LLMProvider::default(),
            api_key: std::env::var("SCHOLARGEN_LLM_API_KEY").unwrap_or_default(),
            api_base_url: String::from("https://api-inference.modelscope.cn/v1"),
            model_efficient: String::from("Qwen/Qwen3-Next-80B-A3B-Instruct"),
            model_powerful: String::from("Qwen/Qwen3-235B-A22B-Instruct-2507"),
            max_tokens: 32768,
            temperature: 0.1,
            retry_attempts: 5,
            retry_delay_ms: 1000,
            timeout_seconds: 300,
            disable_search_tool: false,
            max_parallels: 3,
        }
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_refinements: 2,
            max_repair_prompts: 2,
            pass_threshold: 65.0,
        }
    }
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            snapshot_dir: PathBuf::from(".scholargen/snapshots"),
        }
    }
}
