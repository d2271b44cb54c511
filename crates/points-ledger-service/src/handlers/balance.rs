//! 余额相关的 HTTP 处理器
//!
//! 余额查询与积分提现

use axum::{Extension, Json, extract::State, http::StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::auth::Claims;
use crate::error::{Result, ServiceError};
use crate::models::{Balance, luhn};
use crate::state::AppState;

/// 提现请求
#[derive(Debug, Deserialize)]
pub struct WithdrawRequest {
    pub order: String,
    pub sum: Decimal,
}

/// 查询当前余额
///
/// GET /api/user/balance
pub async fn get_balance(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Balance>> {
    let user_id = claims.user_id()?;
    let balance = state.balances.get_balance(user_id).await?;
    Ok(Json(balance))
}

/// 积分提现
///
/// POST /api/user/balance/withdraw
///
/// 200 成功；402 余额不足；422 订单号非法
pub async fn withdraw(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<WithdrawRequest>,
) -> Result<StatusCode> {
    // 提现用的订单号同样要求通过 Luhn 校验，但不要求已被上传过
    if !luhn::is_valid(&req.order) {
        return Err(ServiceError::InvalidOrderNumber);
    }
    if req.sum <= Decimal::ZERO {
        return Err(ServiceError::Validation("提现金额必须为正数".to_string()));
    }

    let user_id = claims.user_id()?;
    state.balances.withdraw(user_id, &req.order, req.sum).await?;

    Ok(StatusCode::OK)
}
