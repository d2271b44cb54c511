//! 积分账本服务错误类型定义
//!
//! 包含所有面向 HTTP 层的业务错误，以及到状态码和错误码的映射

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// 积分账本服务错误类型
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    // 认证错误
    #[error("未授权: {0}")]
    Unauthorized(String),
    #[error("登录名或密码错误")]
    InvalidCredentials,
    #[error("登录名已被占用")]
    UserExists,
    #[error("用户不存在")]
    UserNotFound,

    // 验证错误
    #[error("参数验证失败: {0}")]
    Validation(String),
    #[error("订单号未通过校验")]
    InvalidOrderNumber,

    // 业务错误
    #[error("订单号已被其他用户上传")]
    OrderOwnedByAnotherUser,
    #[error("积分余额不足")]
    InsufficientFunds,

    // 系统错误
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),
    #[error("内部错误: {0}")]
    Internal(String),
}

impl ServiceError {
    /// 返回对应的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::UserExists | Self::OrderOwnedByAnotherUser => StatusCode::CONFLICT,
            Self::UserNotFound => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            // 提现与订单上传协议都用 422 表示号码不合法
            Self::InvalidOrderNumber => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InsufficientFunds => StatusCode::PAYMENT_REQUIRED,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 返回错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::UserExists => "USER_EXISTS",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidOrderNumber => "INVALID_ORDER_NUMBER",
            Self::OrderOwnedByAnotherUser => "ORDER_CONFLICT",
            Self::InsufficientFunds => "INSUFFICIENT_FUNDS",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // 系统级错误只返回通用提示，详细信息仅记录日志，防止信息泄露
        let message = match &self {
            Self::Database(e) => {
                tracing::error!(error = %e, "数据库操作失败");
                "服务内部错误，请稍后重试".to_string()
            }
            Self::Internal(e) => {
                tracing::error!(error = %e, "内部错误");
                "服务内部错误，请稍后重试".to_string()
            }
            other => other.to_string(),
        };

        let body = json!({
            "success": false,
            "code": self.error_code(),
            "message": message,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// 从 validator 错误转换
impl From<validator::ValidationErrors> for ServiceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

/// 服务层 Result 类型别名
pub type Result<T> = std::result::Result<T, ServiceError>;
