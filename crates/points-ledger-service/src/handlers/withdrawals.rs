//! 提现流水的 HTTP 处理器

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::auth::Claims;
use crate::error::Result;
use crate::state::AppState;

/// 查询当前用户的提现流水
///
/// GET /api/user/withdrawals
///
/// 200 返回列表（最近的在前）；204 尚无提现记录
pub async fn list_withdrawals(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Response> {
    let user_id = claims.user_id()?;

    let withdrawals = state.balances.list_withdrawals(user_id).await?;

    if withdrawals.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    Ok(Json(withdrawals).into_response())
}
