use serde::{Deserialize, Serialize};

/// 目标语言类型
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub enum TargetLanguage {
    #[serde(rename = "en")]
    #[default]
    English,
    #[serde(rename = "zh")]
    Chinese,
    #[serde(rename = "es")]
    Spanish,
    #[serde(rename = "fr")]
    French,
    #[serde(rename = "de")]
    German,
}

impl std::fmt::Display for TargetLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetLanguage::English => write!(f, "en"),
            TargetLanguage::Chinese => write!(f, "zh"),
            TargetLanguage::Spanish => write!(f, "es"),
            TargetLanguage::French => write!(f, "fr"),
            TargetLanguage::German => write!(f, "de"),
        }
    }
}

impl std::str::FromStr for TargetLanguage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "en" | "english" | "英文" => Ok(TargetLanguage::English),
            "zh" | "chinese" | "中文" => Ok(TargetLanguage::Chinese),
            "es" | "spanish" | "español" | "西班牙文" => Ok(TargetLanguage::Spanish),
            "fr" | "french" | "français" | "法文" => Ok(TargetLanguage::French),
            "de" | "german" | "deutsch" | "德文" => Ok(TargetLanguage::German),
            _ => Err(format!("Unknown target language: {}", s)),
        }
    }
}

impl TargetLanguage {
    /// 获取语言的描述性名称
    pub fn display_name(&self) -> &'static str {
        match self {
            TargetLanguage::English => "English",
            TargetLanguage::Chinese => "中文",
            TargetLanguage::Spanish => "Español",
            TargetLanguage::French => "Français",
            TargetLanguage::German => "Deutsch",
        }
    }

    /// 获取语言的提示词指令
    pub fn prompt_instruction(&self) -> &'static str {
        match self {
            TargetLanguage::English => {
                "Please write all proposal content in English, using precise academic language."
            }
            TargetLanguage::Chinese => "请使用中文撰写研究计划书内容，确保语言表达准确、专业、符合学术规范。",
            TargetLanguage::Spanish => {
                "Por favor redacte todo el contenido de la propuesta en español, con un lenguaje académico preciso."
            }
            TargetLanguage::French => {
                "Veuillez rédiger tout le contenu de la proposition en français, dans un langage académique précis."
            }
            TargetLanguage::German => {
                "Bitte verfassen Sie alle Inhalte des Forschungsantrags auf Deutsch in präziser akademischer Sprache."
            }
        }
    }
}
