//! 认证相关的 HTTP 处理器
//!
//! 提供注册和登录的 API，成功时同时通过 Authorization 响应头
//! 和响应体返回 Token

use axum::{Json, extract::State, http::header};
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::auth::{hash_password, verify_password};
use crate::error::{Result, ServiceError};
use crate::state::AppState;

// ============================================
// 请求/响应 DTO
// ============================================

/// 注册/登录请求
///
/// 两个接口共用同一对凭据字段
#[derive(Debug, Deserialize, Validate)]
pub struct CredentialsRequest {
    #[validate(length(min = 1, max = 64, message = "登录名长度必须在 1-64 之间"))]
    pub login: String,
    // bcrypt 只取前 72 字节，这里直接把上限卡在 72
    #[validate(length(min = 1, max = 72, message = "密码长度必须在 1-72 之间"))]
    pub password: String,
}

/// 认证成功响应
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub expires_at: i64,
}

// ============================================
// API 处理器
// ============================================

/// 用户注册
///
/// POST /api/user/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<impl IntoResponse> {
    req.validate()?;

    let password_hash = hash_password(&req.password)?;
    let user_id = state.users.register(&req.login, &password_hash).await?;

    let (token, expires_at) = state.jwt_manager.generate_token(user_id, &req.login)?;

    info!(login = %req.login, "新用户注册成功");

    Ok((
        [(header::AUTHORIZATION, format!("Bearer {token}"))],
        Json(AuthResponse { token, expires_at }),
    ))
}

/// 用户登录
///
/// POST /api/user/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<impl IntoResponse> {
    req.validate()?;

    // 用户不存在和密码错误返回同一个错误，不暴露登录名是否已注册
    let user = state
        .users
        .find_by_login(&req.login)
        .await?
        .ok_or(ServiceError::InvalidCredentials)?;

    if !verify_password(&req.password, &user.password_hash)? {
        return Err(ServiceError::InvalidCredentials);
    }

    let (token, expires_at) = state.jwt_manager.generate_token(user.id, &user.login)?;

    info!(login = %user.login, "用户登录成功");

    Ok((
        [(header::AUTHORIZATION, format!("Bearer {token}"))],
        Json(AuthResponse { token, expires_at }),
    ))
}
