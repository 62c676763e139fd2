use anyhow::{Result, anyhow};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// 时间单位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    #[serde(alias = "day")]
    Days,
    #[serde(alias = "week")]
    Weeks,
    #[serde(alias = "month")]
    Months,
    #[serde(alias = "year")]
    Years,
}

impl TimeUnit {
    /// 单位换算为周数（月按4周、年按52周的工程近似）
    pub fn weeks_per_unit(&self) -> f64 {
        match self {
            TimeUnit::Days => 1.0 / 7.0,
            TimeUnit::Weeks => 1.0,
            TimeUnit::Months => 4.0,
            TimeUnit::Years => 52.0,
        }
    }
}

impl std::fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeUnit::Days => write!(f, "days"),
            TimeUnit::Weeks => write!(f, "weeks"),
            TimeUnit::Months => write!(f, "months"),
            TimeUnit::Years => write!(f, "years"),
        }
    }
}

impl std::str::FromStr for TimeUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().trim_end_matches(',') {
            "day" | "days" => Ok(TimeUnit::Days),
            "week" | "weeks" => Ok(TimeUnit::Weeks),
            "month" | "months" => Ok(TimeUnit::Months),
            "year" | "years" => Ok(TimeUnit::Years),
            other => Err(format!("Unknown time unit: {}", other)),
        }
    }
}

/// 时间跨度，例如 "6 months"
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TimeSpan {
    /// 数值，必须大于0
    pub value: u32,
    /// 时间单位
    pub unit: TimeUnit,
}

impl TimeSpan {
    pub fn new(value: u32, unit: TimeUnit) -> Self {
        Self { value, unit }
    }

    /// 换算为周数，用于跨阶段的时间预算比较
    pub fn as_weeks(&self) -> f64 {
        self.value as f64 * self.unit.weeks_per_unit()
    }

    /// 从 "6 months" 这样的自由文本解析时间跨度
    pub fn parse(text: &str) -> Result<Self> {
        let mut parts = text.split_whitespace();
        let value: u32 = parts
            .next()
            .ok_or_else(|| anyhow!("Empty timeline text"))?
            .parse()
            .map_err(|_| anyhow!("Timeline must start with a number: {}", text))?;
        let unit: TimeUnit = parts
            .next()
            .ok_or_else(|| anyhow!("Timeline is missing a unit: {}", text))?
            .parse()
            .map_err(|e: String| anyhow!(e))?;

        if value == 0 {
            return Err(anyhow!("Timeline value must be positive: {}", text));
        }

        Ok(Self { value, unit })
    }
}

impl std::fmt::Display for TimeSpan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}
