//! 配置管理端点

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{get_config, update_config, AppConfig};
use crate::error::{AppError, AppResult};
use crate::llm::{GeminiClient, GenerationOptions};
use crate::state::AppState;

/// 配置响应（隐藏 api_key 的实际值）
#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    /// 是否已设置 API 密钥
    pub api_key_set: bool,
    pub base_url: String,
    pub model: String,
    pub temperature: f64,
    pub top_k: u32,
    pub top_p: f64,
    pub max_output_tokens: u32,
    pub timeout_secs: u64,
    pub initial_credits: u32,
}

impl From<AppConfig> for ConfigResponse {
    fn from(config: AppConfig) -> Self {
        Self {
            api_key_set: config.has_api_key(),
            base_url: config.base_url,
            model: config.model,
            temperature: config.temperature,
            top_k: config.top_k,
            top_p: config.top_p,
            max_output_tokens: config.max_output_tokens,
            timeout_secs: config.timeout_secs,
            initial_credits: config.initial_credits,
        }
    }
}

/// 配置更新请求
#[derive(Debug, Default, Deserialize)]
pub struct ConfigUpdateRequest {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub top_k: Option<u32>,
    pub top_p: Option<f64>,
    pub max_output_tokens: Option<u32>,
    pub timeout_secs: Option<u64>,
}

impl ConfigUpdateRequest {
    /// 校验取值范围
    fn validate(&self) -> AppResult<()> {
        if let Some(t) = self.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(AppError::BadRequest("temperature must be within 0.0-2.0".to_string()));
            }
        }
        if let Some(p) = self.top_p {
            if !(0.0..=1.0).contains(&p) {
                return Err(AppError::BadRequest("top_p must be within 0.0-1.0".to_string()));
            }
        }
        if self.max_output_tokens == Some(0) {
            return Err(AppError::BadRequest("max_output_tokens must be positive".to_string()));
        }
        if self.timeout_secs == Some(0) {
            return Err(AppError::BadRequest("timeout_secs must be positive".to_string()));
        }
        Ok(())
    }

    /// 把非空字段写入配置
    fn apply(self, config: &mut AppConfig) {
        if let Some(api_key) = self.api_key {
            config.api_key = api_key.trim().to_string();
        }
        if let Some(base_url) = self.base_url {
            config.base_url = base_url;
        }
        if let Some(model) = self.model {
            config.model = model;
        }
        if let Some(temperature) = self.temperature {
            config.temperature = temperature;
        }
        if let Some(top_k) = self.top_k {
            config.top_k = top_k;
        }
        if let Some(top_p) = self.top_p {
            config.top_p = top_p;
        }
        if let Some(max_output_tokens) = self.max_output_tokens {
            config.max_output_tokens = max_output_tokens;
        }
        if let Some(timeout_secs) = self.timeout_secs {
            config.timeout_secs = timeout_secs;
        }
    }
}

/// 配置更新响应
#[derive(Serialize)]
pub struct ConfigUpdateResponse {
    pub success: bool,
    pub message: String,
}

/// 连接测试请求
#[derive(Debug, Default, Deserialize)]
pub struct TestConnectionRequest {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
}

/// 连接测试响应
#[derive(Serialize)]
pub struct TestConnectionResponse {
    pub success: bool,
    pub message: String,
    pub model: String,
}

/// 获取当前配置
async fn get_config_handler() -> Json<ConfigResponse> {
    let config = get_config();
    Json(ConfigResponse::from(config))
}

/// 更新配置，并按新配置重建增强服务
async fn update_config_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ConfigUpdateRequest>,
) -> AppResult<Json<ConfigUpdateResponse>> {
    req.validate()?;
    let updated = update_config(|config| req.apply(config))?;
    state.reload_enhancer(&updated);

    Ok(Json(ConfigUpdateResponse {
        success: true,
        message: "Config updated successfully".to_string(),
    }))
}

/// 确定连接测试使用的密钥、地址和模型
///
/// 指定了 base_url 时必须同时提供 api_key，已保存的密钥只会发往已保存的地址
fn resolve_test_target(
    req: TestConnectionRequest,
    config: AppConfig,
) -> AppResult<(String, String, String)> {
    let model = req.model.unwrap_or(config.model);

    let (api_key, base_url) = match (req.api_key, req.base_url) {
        (Some(api_key), Some(base_url)) => (api_key, base_url),
        (Some(api_key), None) => (api_key, config.base_url),
        (None, None) => (config.api_key, config.base_url),
        (None, Some(_)) => {
            return Err(AppError::BadRequest(
                "api_key is required when base_url is given".to_string(),
            ))
        }
    };

    // 检查 API 密钥
    if api_key.trim().is_empty() {
        return Err(AppError::BadRequest("API Key is required".to_string()));
    }

    Ok((api_key, base_url, model))
}

/// 测试 Gemini 连接
async fn test_connection_handler(
    Json(req): Json<TestConnectionRequest>,
) -> AppResult<Json<TestConnectionResponse>> {
    let config = get_config();
    let timeout = Duration::from_secs(config.timeout_secs);
    let (api_key, base_url, model) = resolve_test_target(req, config)?;

    let client = GeminiClient::new(&api_key, &base_url, &model, timeout)
        .map_err(|e| AppError::BadRequest(format!("创建客户端失败: {}", e)))?;

    // 发送一条很短的测试指令
    let options = GenerationOptions {
        max_output_tokens: 10,
        ..GenerationOptions::default()
    };
    client
        .generate("Hi", &options)
        .await
        .map_err(|e| AppError::Llm(format!("Connection failed: {}", e)))?;

    Ok(Json(TestConnectionResponse {
        success: true,
        message: "Connection successful".to_string(),
        model,
    }))
}

/// 创建配置路由
pub fn config_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/config", get(get_config_handler).put(update_config_handler))
        .route("/api/config/test", post(test_connection_handler))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_response_hides_key() {
        let config = AppConfig {
            api_key: "AIzaSecret".to_string(),
            ..AppConfig::default()
        };
        let value = serde_json::to_value(ConfigResponse::from(config)).unwrap();
        assert_eq!(value["api_key_set"], true);
        assert!(value.get("api_key").is_none());
        assert!(!value.to_string().contains("AIzaSecret"));
    }

    #[test]
    fn test_update_request_validation() {
        let bad = ConfigUpdateRequest {
            temperature: Some(3.5),
            ..Default::default()
        };
        assert!(bad.validate().is_err());

        let bad = ConfigUpdateRequest {
            timeout_secs: Some(0),
            ..Default::default()
        };
        assert!(bad.validate().is_err());

        let ok = ConfigUpdateRequest {
            temperature: Some(0.2),
            top_p: Some(0.9),
            ..Default::default()
        };
        assert!(ok.validate().is_ok());
    }

    fn stored_config() -> AppConfig {
        AppConfig {
            api_key: "AIzaStoredKey".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            ..AppConfig::default()
        }
    }

    #[test]
    fn test_stored_key_never_sent_to_request_url() {
        let req = TestConnectionRequest {
            base_url: Some("http://elsewhere.example".to_string()),
            ..Default::default()
        };
        let err = resolve_test_target(req, stored_config()).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_resolve_test_target() {
        let (key, url, model) = resolve_test_target(TestConnectionRequest::default(), stored_config()).unwrap();
        assert_eq!(key, "AIzaStoredKey");
        assert_eq!(url, "https://generativelanguage.googleapis.com");
        assert_eq!(model, "gemini-pro");

        let req = TestConnectionRequest {
            api_key: Some("AIzaOtherKey".to_string()),
            base_url: Some("http://elsewhere.example".to_string()),
            model: Some("gemini-1.5-flash".to_string()),
        };
        let (key, url, model) = resolve_test_target(req, stored_config()).unwrap();
        assert_eq!(key, "AIzaOtherKey");
        assert_eq!(url, "http://elsewhere.example");
        assert_eq!(model, "gemini-1.5-flash");

        let req = TestConnectionRequest {
            api_key: Some(" ".to_string()),
            ..Default::default()
        };
        assert!(resolve_test_target(req, stored_config()).is_err());
    }

    #[test]
    fn test_update_request_apply() {
        let mut config = AppConfig::default();
        ConfigUpdateRequest {
            api_key: Some(" key ".to_string()),
            model: Some("gemini-1.5-pro".to_string()),
            top_k: Some(20),
            ..Default::default()
        }
        .apply(&mut config);

        assert_eq!(config.api_key, "key");
        assert_eq!(config.model, "gemini-1.5-pro");
        assert_eq!(config.top_k, 20);
        assert_eq!(config.max_output_tokens, 1024);
    }
}
