//! 统一错误处理模块
//!
//! 定义基础设施层共享的错误类型，使用 thiserror 提供良好的错误信息。
//! 业务层错误由各服务自行定义并从这里的类型转换。

use thiserror::Error;

/// 基础设施错误类型
#[derive(Debug, Error)]
pub enum SharedError {
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("配置加载失败: {0}")]
    Config(#[from] config::ConfigError),

    #[error("外部服务错误: {service} - {message}")]
    ExternalService { service: String, message: String },

    #[error("外部服务超时: {service}")]
    ExternalServiceTimeout { service: String },

    #[error("内部错误: {0}")]
    Internal(String),
}

/// 错误结果类型别名
pub type Result<T> = std::result::Result<T, SharedError>;

impl SharedError {
    /// 是否为可重试错误
    ///
    /// 仅瞬时故障（连接抖动、超时）可重试；配置错误重试没有意义。
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Database(_) | Self::ExternalServiceTimeout { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_retryable() {
        let db_err = SharedError::Database(sqlx::Error::PoolTimedOut);
        assert!(db_err.is_retryable());

        let timeout = SharedError::ExternalServiceTimeout {
            service: "accrual".to_string(),
        };
        assert!(timeout.is_retryable());

        let internal = SharedError::Internal("unexpected".to_string());
        assert!(!internal.is_retryable());
    }

    #[test]
    fn test_display_contains_context() {
        let err = SharedError::ExternalService {
            service: "accrual".to_string(),
            message: "connection refused".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("accrual"));
        assert!(msg.contains("connection refused"));
    }
}
