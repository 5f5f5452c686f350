//! API 路由模块

mod config;
mod credits;
mod enhance;
mod health;

pub use config::config_routes;
pub use credits::credits_routes;
pub use enhance::enhance_routes;
pub use health::health_routes;

use axum::{http::Uri, Router};

use crate::error::AppError;
use crate::state::AppState;
use std::sync::Arc;

/// 未匹配路由
async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(uri.path().to_string())
}

/// 创建所有 API 路由
pub fn create_api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(health_routes())
        .merge(config_routes())
        .merge(enhance_routes())
        .merge(credits_routes())
        .fallback(not_found)
        .with_state(state)
}
