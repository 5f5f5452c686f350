//! 额度端点

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::models::{CreditsResponse, GrantCreditsRequest};
use crate::state::AppState;

/// 查询用户额度
async fn get_credits(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Json<CreditsResponse> {
    let credits = state.credits.balance(&user_id);
    Json(CreditsResponse { user_id, credits })
}

/// 发放额度
async fn grant_credits(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Json(req): Json<GrantCreditsRequest>,
) -> AppResult<Json<CreditsResponse>> {
    if req.amount == 0 {
        return Err(AppError::BadRequest("amount must be positive".to_string()));
    }

    let credits = state.credits.grant(&user_id, req.amount);
    Ok(Json(CreditsResponse { user_id, credits }))
}

/// 创建额度路由
pub fn credits_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/credits/:user_id", get(get_credits))
        .route("/api/credits/:user_id/grant", post(grant_credits))
}
