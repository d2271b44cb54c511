//! 待处理订单扫描器
//!
//! 对账管道的生产者：按固定间隔从账本里捞出尚未达到终态的订单号，
//! 逐个写入处理队列。队列有界，工作者饱和时发送阻塞——
//! 扫描器不会跑在处理能力前面。

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::repository::LedgerStore;

/// 订单扫描器
pub struct Scanner {
    store: Arc<dyn LedgerStore>,
    interval: Duration,
    queue: mpsc::Sender<String>,
}

impl Scanner {
    pub fn new(store: Arc<dyn LedgerStore>, interval: Duration, queue: mpsc::Sender<String>) -> Self {
        Self {
            store,
            interval,
            queue,
        }
    }

    /// 主循环：持续扫描直到收到取消信号
    ///
    /// 扫描器退出时持有的发送端随之析构，队列关闭，
    /// 下游工作者由此观察到输入结束。
    pub async fn run(self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(interval = ?self.interval, "订单扫描器已启动");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    if !self.scan_once(&cancel).await {
                        break;
                    }
                }
            }
        }

        info!("订单扫描器已停止");
    }

    /// 执行一轮扫描，返回是否继续下一轮
    ///
    /// 存储错误只记日志并跳过本轮——下一个周期自然会重试，
    /// 不会因为一次瞬时故障拖垮整个扫描循环。
    async fn scan_once(&self, cancel: &CancellationToken) -> bool {
        let numbers = match self.store.list_pending_orders().await {
            Ok(numbers) => numbers,
            Err(e) => {
                warn!(error = %e, "获取待处理订单失败，跳过本轮扫描");
                return true;
            }
        };

        if numbers.is_empty() {
            debug!("没有待处理的订单");
            return true;
        }

        info!(count = numbers.len(), "发现待处理订单，送入处理队列");

        for number in numbers {
            tokio::select! {
                _ = cancel.cancelled() => return false,
                sent = self.queue.send(number) => {
                    // 所有接收端都已退出，继续生产没有意义
                    if sent.is_err() {
                        return false;
                    }
                }
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::repository::traits::MockLedgerStore;

    #[tokio::test(start_paused = true)]
    async fn test_scanner_publishes_pending_orders() {
        let mut store = MockLedgerStore::new();
        store
            .expect_list_pending_orders()
            .returning(|| Ok(vec!["1111".to_string(), "2222".to_string()]));

        let (tx, mut rx) = mpsc::channel(4);
        let cancel = CancellationToken::new();
        let scanner = Scanner::new(Arc::new(store), Duration::from_secs(10), tx);

        let handle = tokio::spawn(scanner.run(cancel.clone()));

        // 第一轮 tick 立即触发
        assert_eq!(rx.recv().await.as_deref(), Some("1111"));
        assert_eq!(rx.recv().await.as_deref(), Some("2222"));

        cancel.cancel();
        handle.await.unwrap();

        // 扫描器退出后队列关闭
        assert!(rx.recv().await.is_none());
    }

    /// 存储故障不会终止扫描循环，下一轮照常进行
    #[tokio::test(start_paused = true)]
    async fn test_scanner_survives_store_errors() {
        let mut store = MockLedgerStore::new();
        let mut calls = 0;
        store.expect_list_pending_orders().returning_st(move || {
            calls += 1;
            if calls == 1 {
                Err(ServiceError::Database(sqlx::Error::PoolTimedOut))
            } else {
                Ok(vec!["3333".to_string()])
            }
        });

        let (tx, mut rx) = mpsc::channel(4);
        let cancel = CancellationToken::new();
        let scanner = Scanner::new(Arc::new(store), Duration::from_secs(10), tx);

        let handle = tokio::spawn(scanner.run(cancel.clone()));

        // 第一轮失败被吞掉，第二轮成功产出
        assert_eq!(rx.recv().await.as_deref(), Some("3333"));

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_scanner_stops_on_cancellation() {
        let mut store = MockLedgerStore::new();
        store
            .expect_list_pending_orders()
            .returning(|| Ok(Vec::new()));

        let (tx, mut rx) = mpsc::channel(4);
        let cancel = CancellationToken::new();
        let scanner = Scanner::new(Arc::new(store), Duration::from_secs(10), tx);

        let handle = tokio::spawn(scanner.run(cancel.clone()));

        cancel.cancel();
        handle.await.unwrap();
        assert!(rx.recv().await.is_none());
    }
}
