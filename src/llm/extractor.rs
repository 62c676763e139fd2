//! 结果提取器 - 把模型的自由文本响应恢复成通过校验的结构化产物

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::types::Validate;

/// 错误预览保留的字符数
const SAMPLE_CHARS: usize = 300;

/// 提取错误
///
/// Unparseable 与 SchemaViolation 是两类不同的失败：前者可以用格式提醒
/// 纠偏重问，后者需要把具体的字段违规逐条反馈给模型。
#[derive(Debug, Clone, thiserror::Error)]
pub enum ExtractionError {
    #[error("无法从响应中解析出JSON对象，响应预览: {sample}")]
    Unparseable { sample: String },
    #[error("JSON不符合目标Schema: {}", .field_errors.join("; "))]
    SchemaViolation { field_errors: Vec<String> },
}

/// 从自由文本中提取JSON对象，按固定顺序尝试三种策略，先成功者生效：
/// 1. 直接解析全文
/// 2. 去掉markdown代码围栏后解析
/// 3. 扫描首个括号配平的 `{...}` 片段并解析
pub fn extract_payload(raw: &str) -> Result<Value, ExtractionError> {
    let trimmed = raw.trim();

    if let Ok(value) = serde_json::from_str::<Value>(trimmed)
        && value.is_object()
    {
        return Ok(value);
    }

    let cleaned = trimmed.replace("```json", "").replace("```", "");
    if let Ok(value) = serde_json::from_str::<Value>(cleaned.trim())
        && value.is_object()
    {
        return Ok(value);
    }

    if let Some(candidate) = first_balanced_object(trimmed)
        && let Ok(value) = serde_json::from_str::<Value>(candidate)
        && value.is_object()
    {
        return Ok(value);
    }

    Err(ExtractionError::Unparseable {
        sample: trimmed.chars().take(SAMPLE_CHARS).collect(),
    })
}

/// 提取并反序列化为目标类型，随后执行领域校验
pub fn extract_typed<T>(raw: &str) -> Result<T, ExtractionError>
where
    T: DeserializeOwned + Validate,
{
    let value = extract_payload(raw)?;

    let typed: T =
        serde_json::from_value(value).map_err(|e| ExtractionError::SchemaViolation {
            field_errors: vec![e.to_string()],
        })?;

    let field_errors = typed.validate();
    if !field_errors.is_empty() {
        return Err(ExtractionError::SchemaViolation { field_errors });
    }

    Ok(typed)
}

/// 找到首个括号配平的JSON对象片段
///
/// 逐字符跟踪字符串与转义状态做括号配平，不使用贪婪正则。
fn first_balanced_object(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let start = text.find('{')?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &byte) in bytes[start..].iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match byte {
            b'\\' if in_string => escaped = true,
            b'"' => in_string = !in_string,
            b'{' if !in_string => depth += 1,
            b'}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    None
}
