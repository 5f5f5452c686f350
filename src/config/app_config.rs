//! 应用配置管理
//!
//! 提供配置的加载、保存、更新功能，使用全局单例模式管理配置状态。
//! 加载顺序：默认值 -> config.json -> 环境变量。

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::error::AppError;

/// 获取配置文件路径
fn get_config_path() -> PathBuf {
    // 配置文件位于可执行文件同级目录
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("config.json")
}

/// 应用配置结构体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Gemini API 密钥，为空时只走本地增强
    #[serde(default)]
    pub api_key: String,

    /// 生成服务基础 URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// 模型名称
    #[serde(default = "default_model")]
    pub model: String,

    /// 温度参数
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// top_k 采样参数
    #[serde(default = "default_top_k")]
    pub top_k: u32,

    /// top_p 采样参数
    #[serde(default = "default_top_p")]
    pub top_p: f64,

    /// 最大输出 token 数
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// 外部调用超时（秒）
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,

    /// 新用户首次出现时发放的额度
    #[serde(default = "default_initial_credits")]
    pub initial_credits: u32,

    /// 上游请求日志目录，未设置时不记录
    #[serde(default)]
    pub request_log_dir: Option<PathBuf>,
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_model() -> String {
    "gemini-pro".to_string()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_top_k() -> u32 {
    40
}

fn default_top_p() -> f64 {
    0.95
}

fn default_max_output_tokens() -> u32 {
    1024
}

fn default_timeout_secs() -> u64 {
    20
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8765
}

fn default_initial_credits() -> u32 {
    10
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            top_k: default_top_k(),
            top_p: default_top_p(),
            max_output_tokens: default_max_output_tokens(),
            timeout_secs: default_timeout_secs(),
            host: default_host(),
            port: default_port(),
            initial_credits: default_initial_credits(),
            request_log_dir: None,
        }
    }
}

impl AppConfig {
    /// 是否配置了 API 密钥
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// 用环境变量覆盖配置
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// 用任意查找函数覆盖配置（便于测试）
    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("GEMINI_API_KEY") {
            self.api_key = key.trim().to_string();
        }
        if let Some(url) = lookup("GEMINI_BASE_URL") {
            self.base_url = url;
        }
        if let Some(model) = lookup("GEMINI_MODEL") {
            self.model = model;
        }
        if let Some(host) = lookup("PROMPTBRAIN_HOST") {
            self.host = host;
        }
        if let Some(dir) = lookup("PROMPTBRAIN_REQUEST_LOG_DIR") {
            self.request_log_dir = Some(PathBuf::from(dir));
        }
        parse_override(&lookup, "PROMPTBRAIN_PORT", &mut self.port);
        parse_override(&lookup, "ENHANCE_TIMEOUT_SECS", &mut self.timeout_secs);
    }
}

/// 解析数值型环境变量，非法值保留原配置
fn parse_override<F, T>(lookup: &F, key: &str, target: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    if let Some(raw) = lookup(key) {
        match raw.trim().parse() {
            Ok(value) => *target = value,
            Err(e) => warn!("Invalid {} value '{}': {}, keeping current setting", key, raw, e),
        }
    }
}

/// 全局配置单例
static CONFIG: Lazy<RwLock<AppConfig>> = Lazy::new(|| {
    let mut config = load_config_from_file().unwrap_or_default();
    config.apply_env_overrides();
    RwLock::new(config)
});

/// 从文件加载配置
fn load_config_from_file() -> Option<AppConfig> {
    let path = get_config_path();
    if path.exists() {
        let content = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&content) {
            Ok(config) => {
                info!("Loaded config from {}", path.display());
                Some(config)
            }
            Err(e) => {
                warn!("Failed to parse {}: {}, using defaults", path.display(), e);
                None
            }
        }
    } else {
        None
    }
}

/// 保存配置到文件
fn save_config_to_file(config: &AppConfig) -> Result<(), AppError> {
    let path = get_config_path();
    let content = serde_json::to_string_pretty(config)
        .map_err(|e| AppError::Config(format!("序列化配置失败: {}", e)))?;
    fs::write(&path, content)
        .map_err(|e| AppError::Config(format!("写入配置文件失败: {}", e)))?;
    Ok(())
}

/// 获取当前配置（克隆）
pub fn get_config() -> AppConfig {
    CONFIG.read().clone()
}

/// 更新配置
///
/// 接收一个闭包来修改配置，修改后自动保存到文件
pub fn update_config<F>(updater: F) -> Result<AppConfig, AppError>
where
    F: FnOnce(&mut AppConfig),
{
    let mut config = CONFIG.write();
    updater(&mut config);
    save_config_to_file(&config)?;
    Ok(config.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.base_url, "https://generativelanguage.googleapis.com");
        assert_eq!(config.model, "gemini-pro");
        assert!((config.temperature - 0.7).abs() < f64::EPSILON);
        assert_eq!(config.top_k, 40);
        assert!((config.top_p - 0.95).abs() < f64::EPSILON);
        assert_eq!(config.max_output_tokens, 1024);
        assert_eq!(config.initial_credits, 10);
        assert!(!config.has_api_key());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{"api_key": "k", "port": 9000}"#).unwrap();
        assert!(config.has_api_key());
        assert_eq!(config.port, 9000);
        assert_eq!(config.timeout_secs, 20);
        assert!(config.request_log_dir.is_none());
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("GEMINI_API_KEY", "  secret  "),
            ("GEMINI_MODEL", "gemini-1.5-flash"),
            ("PROMPTBRAIN_PORT", "9999"),
            ("ENHANCE_TIMEOUT_SECS", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.api_key, "secret");
        assert_eq!(config.model, "gemini-1.5-flash");
        assert_eq!(config.port, 9999);
        // 非法值不覆盖
        assert_eq!(config.timeout_secs, 20);
    }
}
