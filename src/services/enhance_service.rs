//! 提示词增强服务
//!
//! 优先调用 Gemini 生成增强提示词；未配置密钥、调用失败或返回为空时，
//! 静默回退到本地合成。只有问卷模式缺少必填字段会向调用方报错。

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::prompt_service::PromptService;
use crate::config::AppConfig;
use crate::llm::{GeminiClient, GenerationOptions, LlmError};
use crate::models::{EnhancementRequest, EnhancementResult, EnhancementSource, StructuredForm};
use crate::utils::RequestLogger;

/// 增强错误（调用方可见）
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnhanceError {
    #[error("Flow mode requires audience and purpose")]
    MissingFlowFields,
}

/// 增强服务
pub struct EnhanceService {
    client: Option<GeminiClient>,
    options: GenerationOptions,
    prompts: PromptService,
}

impl EnhanceService {
    /// 根据配置创建服务
    pub fn new(config: &AppConfig, logger: Option<Arc<RequestLogger>>) -> Self {
        let client = if config.has_api_key() {
            match GeminiClient::new(
                &config.api_key,
                &config.base_url,
                &config.model,
                Duration::from_secs(config.timeout_secs),
            ) {
                Ok(client) => Some(match logger {
                    Some(logger) => client.with_logger(logger),
                    None => client,
                }),
                Err(e) => {
                    warn!("Failed to create Gemini client: {}", e);
                    None
                }
            }
        } else {
            None
        };

        Self {
            client,
            options: GenerationOptions {
                temperature: config.temperature,
                top_k: config.top_k,
                top_p: config.top_p,
                max_output_tokens: config.max_output_tokens,
            },
            prompts: PromptService::new(),
        }
    }

    /// 校验请求
    pub fn validate(request: &EnhancementRequest) -> Result<(), EnhanceError> {
        if !request.is_flow() {
            return Ok(());
        }

        let answers = request.flow_answers.as_ref();
        let complete = answers.is_some_and(|a| a.audience().is_some() && a.purpose().is_some());
        if complete {
            Ok(())
        } else {
            Err(EnhanceError::MissingFlowFields)
        }
    }

    /// 增强提示词
    pub async fn enhance(&self, request: &EnhancementRequest) -> Result<EnhancementResult, EnhanceError> {
        Self::validate(request)?;
        info!("Enhancing prompt in {} mode", request.result_mode());

        let Some(client) = self.client.as_ref() else {
            info!("No Gemini API key configured, using local enhancement");
            return Ok(self.enhance_locally(request));
        };

        match self.generate_remote(client, request).await {
            Ok(text) => {
                info!("Prompt enhanced successfully using Gemini API");
                Ok(self.build_result(request, text, EnhancementSource::Gemini))
            }
            Err(e) => {
                warn!("Gemini API failed, falling back to local enhancement: {}", e);
                Ok(self.enhance_locally(request))
            }
        }
    }

    /// 本地合成结果（纯计算，不会失败）
    pub fn enhance_locally(&self, request: &EnhancementRequest) -> EnhancementResult {
        let text = self.prompts.local_enhancement(request);
        self.build_result(request, text, EnhancementSource::Local)
    }

    async fn generate_remote(
        &self,
        client: &GeminiClient,
        request: &EnhancementRequest,
    ) -> Result<String, LlmError> {
        let instruction = self.prompts.build_instruction(request);
        let raw = client.generate(&instruction, &self.options).await?;
        let cleaned = self.prompts.clean_generated_text(&raw);

        if cleaned.trim().is_empty() {
            debug!("Generated text was empty after cleanup: {:?}", raw);
            return Err(LlmError::EmptyResponse);
        }
        Ok(cleaned)
    }

    fn build_result(
        &self,
        request: &EnhancementRequest,
        text: String,
        source: EnhancementSource,
    ) -> EnhancementResult {
        EnhancementResult {
            structured_form: StructuredForm::new(request.flow_answers.as_ref(), &text),
            enhanced_text: text,
            mode: request.result_mode(),
            source,
        }
    }
}
