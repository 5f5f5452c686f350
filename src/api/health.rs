//! 健康检查端点

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::config::get_config;
use crate::state::AppState;

/// 健康检查
///
/// `gemini` 表示是否配置了密钥；未配置时服务仍可用，只是全部走本地增强
async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "gemini": get_config().has_api_key()
    }))
}

pub fn health_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/health", get(health_check))
}
