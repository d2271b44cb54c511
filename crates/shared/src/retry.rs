//! 重试策略与执行器
//!
//! 提供指数退避重试机制，用于瞬时故障（网络抖动、数据库连接池满等）的自动恢复。
//! 业务逻辑错误（如参数无效）不应被重试——由调用方通过 `is_retryable` 闭包控制。

use std::future::Future;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::SharedError;

// ---------------------------------------------------------------------------
// RetryPolicy — 重试策略配置
// ---------------------------------------------------------------------------

/// 重试策略配置
///
/// 使用指数退避避免重试风暴：首次失败等 1 秒，第 2 次等 2 秒，
/// 第 3 次等 4 秒...直到达到最大间隔或最大重试次数。
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// 最大重试次数（不含首次执行）
    pub max_retries: u32,
    /// 首次重试前的等待时间
    pub initial_delay: Duration,
    /// 退避时间上限，防止等待过长
    pub max_delay: Duration,
    /// 每次重试的退避倍数
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    /// 默认策略：最多重试 3 次，初始等待 1 秒，最大等待 30 秒，倍数 2.0
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// 计算第 N 次重试的等待时间（attempt 从 0 开始）
    ///
    /// 公式: initial_delay * multiplier^attempt，结果不超过 max_delay。
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base_ms = self.initial_delay.as_millis() as f64;
        let delay_ms = base_ms * self.multiplier.powi(attempt as i32);
        let capped_ms = delay_ms.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped_ms as u64)
    }

    /// 是否应继续重试
    ///
    /// attempt 表示已经失败的次数，当 attempt < max_retries 时返回 true。
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }
}

// ---------------------------------------------------------------------------
// retry_with_policy — 带重试的异步执行器
// ---------------------------------------------------------------------------

/// 带重试的异步执行器
///
/// 对任意异步操作应用重试策略。仅在操作返回可重试错误时才重试，
/// 业务逻辑错误不会被重试，直接向上传播。
pub async fn retry_with_policy<F, Fut, T>(
    policy: &RetryPolicy,
    operation_name: &str,
    is_retryable: impl Fn(&SharedError) -> bool,
    mut operation: F,
) -> Result<T, SharedError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SharedError>>,
{
    let mut attempt: u32 = 0;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    info!(operation = operation_name, attempt, "操作在重试后成功");
                }
                return Ok(value);
            }
            Err(err) => {
                // 非瞬时错误不重试，直接返回
                if !is_retryable(&err) {
                    warn!(
                        operation = operation_name,
                        error = %err,
                        "操作失败且不可重试，直接返回错误"
                    );
                    return Err(err);
                }

                // 已用尽重试次数
                if !policy.should_retry(attempt) {
                    warn!(
                        operation = operation_name,
                        attempt,
                        max_retries = policy.max_retries,
                        error = %err,
                        "已达最大重试次数，放弃重试"
                    );
                    return Err(err);
                }

                let delay = policy.delay_for_attempt(attempt);
                warn!(
                    operation = operation_name,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "操作失败，将在退避后重试"
                );

                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// 单元测试
// ---------------------------------------------------------------------------
