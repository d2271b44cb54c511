//! 统一可观测性模块
//!
//! 提供结构化日志的统一初始化和 HTTP 请求追踪中间件。
//! 所有服务通过单一入口点配置日志，确保一致的格式和字段命名。

pub mod middleware;
pub mod tracing;

use ::tracing::info;
use anyhow::Result;

use crate::config::ObservabilityConfig;

/// 统一初始化可观测性
///
/// 根据配置选择 pretty（本地开发）或 json（生产采集）日志格式，
/// RUST_LOG 环境变量优先于配置文件中的 log_level。
pub fn init(service_name: &str, config: &ObservabilityConfig) -> Result<()> {
    tracing::init(config)?;

    info!(
        service = %service_name,
        log_level = %config.log_level,
        log_format = %config.log_format,
        "Observability initialized"
    );

    Ok(())
}
