//! 学术文献检索工具

use serde::{Deserialize, Serialize};
use std::time::Duration;

use rig::tool::Tool;

/// Crossref works API 的默认地址
const DEFAULT_API_BASE_URL: &str = "https://api.crossref.org";

/// 单次检索返回的最大条目数
const MAX_ROWS: u8 = 10;

/// 文献检索工具 - 查询Crossref获取题录信息
#[derive(Debug, Clone)]
pub struct AgentToolScholarSearch {
    client: reqwest::Client,
    api_base_url: String,
}

/// 检索参数
#[derive(Debug, Deserialize)]
pub struct ScholarSearchArgs {
    /// 检索关键词
    pub query: String,
    /// 返回条目数（默认5，上限10）
    pub rows: Option<u8>,
}

/// 单条检索命中
#[derive(Debug, Serialize)]
pub struct ScholarSearchHit {
    pub title: String,
    pub url: String,
    pub source: Option<String>,
}

/// 检索结果
#[derive(Debug, Serialize)]
pub struct ScholarSearchResult {
    pub query: String,
    pub hits: Vec<ScholarSearchHit>,
}

/// 检索工具错误
#[derive(Debug, thiserror::Error)]
#[error("Scholar search error: {0}")]
pub struct ScholarSearchError(String);

impl Default for AgentToolScholarSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentToolScholarSearch {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_API_BASE_URL)
    }

    pub fn with_base_url(api_base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .user_agent("scholargen-rs")
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn search(&self, args: &ScholarSearchArgs) -> Result<ScholarSearchResult, String> {
        let rows = args.rows.unwrap_or(5).min(MAX_ROWS).to_string();
        let request_url = format!("{}/works", self.api_base_url);

        let response = self
            .client
            .get(&request_url)
            .query(&[("query", args.query.as_str()), ("rows", rows.as_str())])
            .send()
            .await
            .map_err(|e| format!("请求检索服务失败: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("检索服务返回异常状态: {}", response.status()));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| format!("解析检索响应失败: {}", e))?;

        let hits = payload["message"]["items"]
            .as_array()
            .map(|items| items.iter().filter_map(parse_crossref_item).collect())
            .unwrap_or_default();

        Ok(ScholarSearchResult {
            query: args.query.clone(),
            hits,
        })
    }
}

/// 从Crossref条目中提取题录字段，缺少标题或链接的条目直接丢弃
fn parse_crossref_item(item: &serde_json::Value) -> Option<ScholarSearchHit> {
    let title = item["title"].as_array()?.first()?.as_str()?.to_string();
    let url = item["URL"].as_str()?.to_string();
    let source = item["container-title"]
        .as_array()
        .and_then(|titles| titles.first())
        .and_then(|t| t.as_str())
        .map(|t| t.to_string());

    Some(ScholarSearchHit { title, url, source })
}

impl Tool for AgentToolScholarSearch {
    const NAME: &'static str = "scholar_search";

    type Error = ScholarSearchError;
    type Args = ScholarSearchArgs;
    type Output = ScholarSearchResult;

    async fn definition(&self, _prompt: String) -> rig::completion::ToolDefinition {
        rig::completion::ToolDefinition {
            name: Self::NAME.to_string(),
            description: "检索学术文献题录（标题、链接、来源），用于研究问题定义阶段的初步文献调研。"
                .to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "检索关键词，建议使用英文学术术语"
                    },
                    "rows": {
                        "type": "integer",
                        "description": "返回的文献条目数（默认5，上限10）"
                    }
                },
                "required": ["query"]
            }),
        }
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        println!("   🔧 tool called...scholar_search@{:?}", args.query);

        self.search(&args).await.map_err(ScholarSearchError)
    }
}
