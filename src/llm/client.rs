//! Gemini 文本生成客户端

use reqwest::Client;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

use super::format::build_generate_content_endpoint;
use super::types::{GenerateContentRequest, GenerateContentResponse, GenerationOptions, LlmError};
use crate::utils::RequestLogger;

/// Gemini 文本生成客户端
///
/// 每次调用只发送一次请求，不做重试；超时由 HTTP 客户端统一控制
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    timeout: Duration,
    logger: Option<Arc<RequestLogger>>,
}

impl GeminiClient {
    /// 创建新的客户端
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(LlmError::ConfigError("API Key is required".to_string()));
        }

        // 构建 HTTP 客户端
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .pool_max_idle_per_host(5)
            .build()
            .map_err(LlmError::HttpError)?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.into(),
            model: model.into(),
            timeout,
            logger: None,
        })
    }

    /// 附加请求日志记录器
    pub fn with_logger(mut self, logger: Arc<RequestLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// 发送单条文本指令并返回第一段生成文本
    pub async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String, LlmError> {
        let endpoint = build_generate_content_endpoint(&self.base_url, &self.model);
        let request_id = RequestLogger::generate_request_id();
        info!("LLM request: request_id={}, model={}", request_id, self.model);

        let entry = self.logger.as_ref().map(|logger| {
            logger.log_request(
                &request_id,
                &endpoint,
                &self.model,
                prompt,
                options,
                self.timeout.as_secs(),
                &self.base_url,
                &self.api_key,
            )
        });
        let start = Instant::now();

        let result = self.send(&endpoint, prompt, options).await;

        if let (Some(logger), Some(entry)) = (self.logger.as_ref(), entry) {
            let entry = match &result {
                Ok(text) => RequestLogger::finish_success(entry, start, text),
                Err(e) => RequestLogger::finish_error(entry, start, e.kind(), &e.to_string(), e.status_code()),
            };
            logger.record(entry).await;
        }

        result
    }

    async fn send(
        &self,
        endpoint: &str,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, LlmError> {
        let payload = GenerateContentRequest::single_text(prompt, options);
        debug!("Gemini API request: endpoint={}, model={}", endpoint, self.model);

        let response = self
            .client
            .post(endpoint)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(map_transport_error)?;

        // 检查状态码
        let status = response.status();
        if !status.is_success() {
            let status_code = status.as_u16();
            let error_text = response.text().await.unwrap_or_default();
            let preview: String = error_text.chars().take(500).collect();
            error!("Gemini API error: status={}, body={}", status_code, preview);
            return Err(LlmError::ApiError {
                status: status_code,
                message: error_text,
            });
        }

        let body = response.text().await.map_err(map_transport_error)?;
        let parsed: GenerateContentResponse = serde_json::from_str(&body)?;

        match parsed.first_text() {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(LlmError::EmptyResponse),
        }
    }
}

/// 超时单独归类，其余保持原始 reqwest 错误
fn map_transport_error(e: reqwest::Error) -> LlmError {
    if e.is_timeout() {
        LlmError::Timeout
    } else {
        LlmError::HttpError(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ENDPOINT_PATH: &str = "/v1beta/models/gemini-pro:generateContent";

    fn client_for(server: &MockServer, timeout: Duration) -> GeminiClient {
        GeminiClient::new("test-key", server.uri(), "gemini-pro", timeout).unwrap()
    }

    #[test]
    fn test_new_requires_api_key() {
        let result = GeminiClient::new("  ", "http://localhost", "gemini-pro", Duration::from_secs(1));
        assert!(matches!(result, Err(LlmError::ConfigError(_))));
    }

    #[tokio::test]
    async fn test_generate_returns_first_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT_PATH))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_partial_json(json!({
                "contents": [{"parts": [{"text": "say hi"}]}],
                "generationConfig": {"topK": 40, "maxOutputTokens": 1024}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "hi there"}], "role": "model"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::from_secs(5));
        let text = client.generate("say hi", &GenerationOptions::default()).await.unwrap();
        assert_eq!(text, "hi there");
    }

    #[tokio::test]
    async fn test_generate_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT_PATH))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::from_secs(5));
        let err = client.generate("x", &GenerationOptions::default()).await.unwrap_err();
        match err {
            LlmError::ApiError { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_generate_empty_candidates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::from_secs(5));
        let err = client.generate("x", &GenerationOptions::default()).await.unwrap_err();
        assert!(matches!(err, LlmError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_generate_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"candidates": []}))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::from_millis(300));
        let err = client.generate("x", &GenerationOptions::default()).await.unwrap_err();
        assert!(matches!(err, LlmError::Timeout));
    }
}
