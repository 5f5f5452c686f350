//! 提示词增强端点

use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    routing::post,
    Json, Router,
};
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::AppResult;
use crate::models::{EnhanceMode, EnhanceResponse, EnhancementRequest};
use crate::services::EnhanceService;
use crate::state::AppState;

/// 标识调用用户的请求头，缺省时不计额度
pub const USER_ID_HEADER: &str = "x-user-id";

/// 读取用户标识
pub fn user_id_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// 增强提示词
///
/// 顺序：校验 -> 扣减额度 -> 增强。校验失败不扣额度，增强本身不会失败。
/// 请求体无法解析时直接返回 local 模式的通用结果，不调用外部服务也不扣额度。
async fn enhance_prompt(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<EnhancementRequest>, JsonRejection>,
) -> AppResult<Json<EnhanceResponse>> {
    let enhancer = state.enhancer();

    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!("Unreadable enhance request, using local enhancement: {}", rejection.body_text());
            let request = EnhancementRequest {
                mode: Some(EnhanceMode::Local),
                ..Default::default()
            };
            return Ok(Json(EnhanceResponse::new(enhancer.enhance_locally(&request), None)));
        }
    };

    EnhanceService::validate(&request)?;

    let credits_remaining = match user_id_from_headers(&headers) {
        Some(user_id) => {
            let remaining = state.credits.try_consume(&user_id)?;
            info!("Credit consumed for user: {} (remaining={})", user_id, remaining);
            Some(remaining)
        }
        None => None,
    };

    let result = enhancer.enhance(&request).await?;

    Ok(Json(EnhanceResponse::new(result, credits_remaining)))
}

/// 创建增强路由
pub fn enhance_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/enhance-prompt", post(enhance_prompt))
}
