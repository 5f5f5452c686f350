//! REST API 请求/响应模型

use serde::{Deserialize, Serialize};

use super::enhance::{EnhancementResult, EnhancementSource};

/// 增强响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhanceResponse {
    pub success: bool,
    pub enhanced_prompt: String,
    pub json_format: String,
    pub mode: String,
    /// 结果来源：gemini 或 local
    pub source: EnhancementSource,
    /// 仅在请求带有用户标识时返回
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credits_remaining: Option<u32>,
}

impl EnhanceResponse {
    pub fn new(result: EnhancementResult, credits_remaining: Option<u32>) -> Self {
        Self {
            success: true,
            json_format: result.structured_form.to_json(),
            enhanced_prompt: result.enhanced_text,
            mode: result.mode.as_str().to_string(),
            source: result.source,
            credits_remaining,
        }
    }
}

/// 额度查询响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditsResponse {
    pub user_id: String,
    pub credits: u32,
}

/// 额度发放请求
#[derive(Debug, Deserialize)]
pub struct GrantCreditsRequest {
    pub amount: u32,
}
