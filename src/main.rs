//! PromptBrain - Prompt Enhancement Backend
//!
//! 使用 axum 框架构建的后端服务，提供提示词增强（Gemini + 本地回退）和用户额度功能。

use anyhow::Context;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod config;
mod error;
mod llm;
mod models;
mod services;
mod state;
mod utils;

use api::create_api_routes;
use config::get_config;
use state::create_shared_state;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "promptbrain_backend=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting PromptBrain backend...");

    let config = get_config();
    if config.has_api_key() {
        info!("Gemini enhancement enabled: model={}", config.model);
    } else {
        warn!("GEMINI_API_KEY not set, all enhancements will use the local fallback");
    }

    // 创建共享状态
    let state = create_shared_state(&config);

    // 配置 CORS（允许所有来源）
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // 构建路由
    let app = Router::new()
        .merge(create_api_routes(Arc::clone(&state)))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // 绑定地址（host 可以是主机名）
    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("failed to bind {}:{}", config.host, config.port))?;
    info!("Server listening on: {}", listener.local_addr()?);

    // 启动服务器
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
