//! 日志初始化模块
//!
//! 基于 tracing-subscriber 提供结构化日志，支持 JSON 和人类可读两种格式。

use anyhow::Result;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::config::ObservabilityConfig;

/// 初始化 tracing 日志
///
/// 环境过滤器优先级：RUST_LOG 环境变量 > 配置文件 log_level > "info"。
/// 重复初始化返回错误（try_init 保证全局 subscriber 只设置一次）。
pub fn init(config: &ObservabilityConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = if config.log_format == "json" {
        fmt::layer()
            .json()
            .with_span_events(FmtSpan::CLOSE)
            .with_target(true)
            .with_thread_ids(true)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent_failure() {
        let config = ObservabilityConfig::default();
        // 第一次初始化可能成功也可能因为其他测试已初始化而失败，
        // 但第二次一定失败，且不应 panic
        let _ = init(&config);
        assert!(init(&config).is_err());
    }
}
