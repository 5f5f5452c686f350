//! 应用状态管理
//!
//! 定义在请求处理器之间共享的状态：增强服务（持有复用连接池的 HTTP 客户端）、
//! 额度账本和可选的上游请求日志。

use parking_lot::RwLock;
use std::sync::Arc;
use tracing::info;

use crate::config::AppConfig;
use crate::services::{CreditLedger, EnhanceService};
use crate::utils::RequestLogger;

/// 应用共享状态
///
/// 使用 Arc 包裹以便在多个处理器之间安全共享
pub struct AppState {
    /// 当前配置对应的增强服务，配置更新后整体替换
    enhancer: RwLock<Arc<EnhanceService>>,
    /// 用户额度账本
    pub credits: CreditLedger,
    /// 上游请求日志（未配置目录时为 None）
    request_logger: Option<Arc<RequestLogger>>,
}

impl AppState {
    /// 根据配置创建应用状态
    pub fn from_config(config: &AppConfig) -> Self {
        let request_logger = config.request_log_dir.as_deref().map(|dir| {
            let logger = RequestLogger::new(dir);
            info!("Upstream request log: {}", logger.log_path().display());
            Arc::new(logger)
        });
        let enhancer = EnhanceService::new(config, request_logger.clone());

        Self {
            enhancer: RwLock::new(Arc::new(enhancer)),
            credits: CreditLedger::new(config.initial_credits),
            request_logger,
        }
    }

    /// 获取当前增强服务
    pub fn enhancer(&self) -> Arc<EnhanceService> {
        Arc::clone(&self.enhancer.read())
    }

    /// 按新配置重建增强服务
    ///
    /// 已经拿到旧服务的请求继续使用旧服务完成
    pub fn reload_enhancer(&self, config: &AppConfig) {
        let service = EnhanceService::new(config, self.request_logger.clone());
        *self.enhancer.write() = Arc::new(service);
        info!("Enhance service reloaded: gemini={}", config.has_api_key());
    }
}

/// 创建可共享的应用状态
pub fn create_shared_state(config: &AppConfig) -> Arc<AppState> {
    Arc::new(AppState::from_config(config))
}
