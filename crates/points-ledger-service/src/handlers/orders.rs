//! 订单相关的 HTTP 处理器
//!
//! 订单号上传（text/plain）与订单列表查询。
//! 上传只负责受理：核算由后台对账管道异步完成，不在请求路径上等待。

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::info;

use crate::auth::Claims;
use crate::error::{Result, ServiceError};
use crate::models::luhn;
use crate::repository::OrderSubmission;
use crate::state::AppState;

/// 上传订单号
///
/// POST /api/user/orders（请求体为纯文本订单号）
///
/// 202 新订单已受理；200 本人重复上传；409 他人已占用；422 号码非法
pub async fn create_order(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    body: String,
) -> Result<StatusCode> {
    let number = body.trim();
    if number.is_empty() {
        return Err(ServiceError::Validation(
            "请求体为空，请提供订单号".to_string(),
        ));
    }
    if !luhn::is_valid(number) {
        return Err(ServiceError::InvalidOrderNumber);
    }

    let user_id = claims.user_id()?;

    match state.orders.create_order(user_id, number).await? {
        OrderSubmission::Accepted => {
            info!(order = %number, "订单号已受理，等待核算");
            Ok(StatusCode::ACCEPTED)
        }
        OrderSubmission::AlreadyUploaded => Ok(StatusCode::OK),
    }
}

/// 查询当前用户的订单列表
///
/// GET /api/user/orders
///
/// 200 返回列表（最新上传的在前）；204 尚无订单
pub async fn list_orders(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Response> {
    let user_id = claims.user_id()?;

    let orders = state.orders.list_user_orders(user_id).await?;

    if orders.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    Ok(Json(orders).into_response())
}
