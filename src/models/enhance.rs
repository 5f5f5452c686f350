//! 提示词增强的领域类型

use serde::{Deserialize, Serialize};
use std::fmt;

/// 增强模式
///
/// 除 flow 以外的模式都按直接模式处理，未知模式原样回显
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum EnhanceMode {
    /// 直接改写原始提示词
    Direct,
    /// 基于问卷（受众、目的、风格、约束）生成
    Flow,
    /// 未指定模式时的本地标记
    Local,
    /// 其它调用方自定义的模式名
    Other(String),
}

impl EnhanceMode {
    pub fn as_str(&self) -> &str {
        match self {
            EnhanceMode::Direct => "direct",
            EnhanceMode::Flow => "flow",
            EnhanceMode::Local => "local",
            EnhanceMode::Other(name) => name,
        }
    }
}

impl From<String> for EnhanceMode {
    fn from(name: String) -> Self {
        match name.as_str() {
            "direct" => EnhanceMode::Direct,
            "flow" => EnhanceMode::Flow,
            "local" => EnhanceMode::Local,
            _ => EnhanceMode::Other(name),
        }
    }
}

impl fmt::Display for EnhanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 问卷答案
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowAnswers {
    #[serde(default)]
    pub audience: Option<String>,
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub constraints: Option<String>,
}

impl FlowAnswers {
    pub fn audience(&self) -> Option<&str> {
        non_empty(&self.audience)
    }

    pub fn purpose(&self) -> Option<&str> {
        non_empty(&self.purpose)
    }

    pub fn style(&self) -> Option<&str> {
        non_empty(&self.style)
    }

    pub fn constraints(&self) -> Option<&str> {
        non_empty(&self.constraints)
    }
}

/// 空字符串与缺失同等对待
fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// 增强请求
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancementRequest {
    #[serde(default)]
    pub mode: Option<EnhanceMode>,
    #[serde(default)]
    pub original_prompt: Option<String>,
    #[serde(default, rename = "flowData")]
    pub flow_answers: Option<FlowAnswers>,
}

impl EnhancementRequest {
    /// 直接模式请求
    pub fn direct(prompt: impl Into<String>) -> Self {
        Self {
            mode: Some(EnhanceMode::Direct),
            original_prompt: Some(prompt.into()),
            flow_answers: None,
        }
    }

    /// 问卷模式请求
    pub fn flow(answers: FlowAnswers) -> Self {
        Self {
            mode: Some(EnhanceMode::Flow),
            original_prompt: None,
            flow_answers: Some(answers),
        }
    }

    pub fn is_flow(&self) -> bool {
        self.mode == Some(EnhanceMode::Flow)
    }

    pub fn original_prompt(&self) -> Option<&str> {
        non_empty(&self.original_prompt)
    }

    /// 结果中回显的模式：未指定时为 local
    pub fn result_mode(&self) -> EnhanceMode {
        self.mode.clone().unwrap_or(EnhanceMode::Local)
    }
}

/// 结构化表示，字段顺序即输出 JSON 的键顺序
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredForm {
    pub audience: String,
    pub purpose: String,
    pub tone: String,
    pub constraints: String,
    pub enhanced_prompt: String,
}

impl StructuredForm {
    pub fn new(answers: Option<&FlowAnswers>, enhanced_prompt: &str) -> Self {
        let field = |pick: fn(&FlowAnswers) -> Option<&str>, default: &str| {
            answers.and_then(pick).unwrap_or(default).to_string()
        };

        Self {
            audience: field(FlowAnswers::audience, "General audience"),
            purpose: field(FlowAnswers::purpose, "General purpose"),
            tone: field(FlowAnswers::style, "Professional"),
            constraints: field(FlowAnswers::constraints, "No specific constraints"),
            enhanced_prompt: enhanced_prompt.to_string(),
        }
    }

    /// 两空格缩进的 JSON 文本
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// 结果来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EnhancementSource {
    /// 外部生成服务
    Gemini,
    /// 本地合成
    Local,
}

/// 增强结果
#[derive(Debug, Clone, PartialEq)]
pub struct EnhancementResult {
    pub enhanced_text: String,
    pub structured_form: StructuredForm,
    pub mode: EnhanceMode,
    pub source: EnhancementSource,
}
