//! 积分核算对账管道
//!
//! 持续运行的后台子系统：发现等待判定的订单，轮询外部核算服务，
//! 把核算结果转换成账本更新并落库。
//!
//! 结构上是一个生产者/消费者管道：
//!
//! ```text
//! Scanner -> 队列 -> Worker 池 -> AccrualClient（受 ThrottleGate 节流）-> LedgerStore
//! ```
//!
//! 取消信号让扫描器停止生产并关闭队列，工作者在下一个阻塞点
//! （收队列、限流等待、网络查询）观察到取消后退出。

pub mod backoff;
pub mod client;
pub mod scanner;
pub mod worker;

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::info;

use points_shared::config::AccrualConfig;

use crate::repository::LedgerStore;

pub use backoff::{ThrottleEpisode, ThrottleGate};
pub use client::{AccrualClient, AccrualError, AccrualFetch, AccrualStatus, FetchOutcome, OrderVerdict};
pub use scanner::Scanner;
pub use worker::Worker;

/// 对账管道
///
/// 把扫描器、工作者池和共享限流闸门组装起来。
/// 队列容量为 1：扫描器被工作者的处理能力天然回压，
/// 不会把一大批订单堆积在内存里。
pub struct ReconciliationPipeline {
    store: Arc<dyn LedgerStore>,
    fetcher: Arc<dyn AccrualFetch>,
    config: AccrualConfig,
}

impl ReconciliationPipeline {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        fetcher: Arc<dyn AccrualFetch>,
        config: AccrualConfig,
    ) -> Self {
        Self {
            store,
            fetcher,
            config,
        }
    }

    /// 启动管道的全部后台任务
    ///
    /// 返回的 JoinSet 由调用方持有，停机时在宽限期内等待其清空
    pub fn spawn(self, cancel: CancellationToken) -> JoinSet<()> {
        let (tx, rx) = mpsc::channel::<String>(1);
        let queue = Arc::new(Mutex::new(rx));
        let gate = Arc::new(ThrottleGate::new());

        let mut tasks = JoinSet::new();

        let scanner = Scanner::new(self.store.clone(), self.config.poll_interval(), tx);
        tasks.spawn(scanner.run(cancel.clone()));

        for id in 0..self.config.worker_count {
            let worker = Worker::new(
                id,
                self.store.clone(),
                self.fetcher.clone(),
                gate.clone(),
                queue.clone(),
            );
            tasks.spawn(worker.run(cancel.clone()));
        }

        info!(
            workers = self.config.worker_count,
            poll_interval = ?self.config.poll_interval(),
            "对账管道已启动"
        );

        tasks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use rust_decimal::Decimal;

    use crate::error::Result;
    use crate::models::OrderStatus;

    /// 内存账本：记录每个订单的状态与累计入账金额，
    /// 模拟真实仓储的「终态订单不再变更」条件更新语义
    #[derive(Default)]
    struct InMemoryLedger {
        orders: StdMutex<HashMap<String, (OrderStatus, Decimal)>>,
        balance: StdMutex<Decimal>,
    }

    impl InMemoryLedger {
        fn with_orders(numbers: &[&str]) -> Self {
            let ledger = Self::default();
            {
                let mut orders = ledger.orders.lock().unwrap();
                for number in numbers {
                    orders.insert(number.to_string(), (OrderStatus::New, Decimal::ZERO));
                }
            }
            ledger
        }

        fn status_of(&self, number: &str) -> Option<OrderStatus> {
            self.orders.lock().unwrap().get(number).map(|(s, _)| *s)
        }

        fn balance(&self) -> Decimal {
            *self.balance.lock().unwrap()
        }
    }

    #[async_trait]
    impl LedgerStore for InMemoryLedger {
        async fn list_pending_orders(&self) -> Result<Vec<String>> {
            let orders = self.orders.lock().unwrap();
            Ok(orders
                .iter()
                .filter(|(_, (status, _))| !status.is_terminal())
                .map(|(number, _)| number.clone())
                .collect())
        }

        async fn apply_accrual(
            &self,
            number: &str,
            status: OrderStatus,
            accrual: Option<Decimal>,
        ) -> Result<()> {
            let mut orders = self.orders.lock().unwrap();
            let Some(entry) = orders.get_mut(number) else {
                return Ok(());
            };
            // 条件更新：终态订单不再变化
            if entry.0.is_terminal() {
                return Ok(());
            }
            entry.0 = status;
            if status.earns_bonus() {
                let amount = accrual.unwrap_or_default();
                entry.1 += amount;
                *self.balance.lock().unwrap() += amount;
            }
            Ok(())
        }
    }

    /// 固定应答的核算服务：按订单号返回预设结果
    struct ScriptedAccrual {
        verdicts: HashMap<String, (&'static str, Option<Decimal>)>,
    }

    #[async_trait]
    impl AccrualFetch for ScriptedAccrual {
        async fn order_status(
            &self,
            number: &str,
        ) -> std::result::Result<FetchOutcome, AccrualError> {
            match self.verdicts.get(number) {
                Some((status, accrual)) => Ok(FetchOutcome::Verdict(OrderVerdict {
                    order: number.to_string(),
                    status: (*status).to_string(),
                    accrual: *accrual,
                })),
                None => Ok(FetchOutcome::NotRegistered),
            }
        }
    }

    fn test_config() -> AccrualConfig {
        AccrualConfig {
            poll_interval_seconds: 1,
            worker_count: 2,
            ..AccrualConfig::default()
        }
    }

    /// 端到端场景：两个待处理订单分别判定为 PROCESSED(+150) 和 INVALID，
    /// 余额只增加 150，且重复扫描不会二次入账
    #[tokio::test(start_paused = true)]
    async fn test_pipeline_reconciles_pending_orders() {
        let ledger = Arc::new(InMemoryLedger::with_orders(&["1111", "2222"]));

        let mut verdicts = HashMap::new();
        verdicts.insert(
            "1111".to_string(),
            ("PROCESSED", Some(Decimal::new(150, 0))),
        );
        verdicts.insert("2222".to_string(), ("INVALID", None));
        let accrual = Arc::new(ScriptedAccrual { verdicts });

        let cancel = CancellationToken::new();
        let pipeline = ReconciliationPipeline::new(ledger.clone(), accrual, test_config());
        let mut tasks = pipeline.spawn(cancel.clone());

        // 等到两个订单都达到终态（虚拟时间自动推进扫描周期）
        let deadline = tokio::time::Instant::now() + tokio::time::Duration::from_secs(60);
        loop {
            let done = ledger.status_of("1111") == Some(OrderStatus::Processed)
                && ledger.status_of("2222") == Some(OrderStatus::Invalid);
            if done {
                break;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "订单在多个扫描周期后仍未达到终态"
            );
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        // 多等几个扫描周期，确认终态订单不会被重复入账
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(ledger.balance(), Decimal::new(150, 0));

        cancel.cancel();
        while tasks.join_next().await.is_some() {}
    }

    /// 取消信号让扫描器与所有工作者在有限时间内退出
    #[tokio::test(start_paused = true)]
    async fn test_pipeline_shuts_down_on_cancellation() {
        let ledger = Arc::new(InMemoryLedger::with_orders(&["1111"]));
        let accrual = Arc::new(ScriptedAccrual {
            verdicts: HashMap::new(),
        });

        let cancel = CancellationToken::new();
        let pipeline = ReconciliationPipeline::new(ledger, accrual, test_config());
        let mut tasks = pipeline.spawn(cancel.clone());

        tokio::time::sleep(Duration::from_secs(2)).await;
        cancel.cancel();

        let drained = tokio::time::timeout(Duration::from_secs(5), async {
            while tasks.join_next().await.is_some() {}
        })
        .await;

        assert!(drained.is_ok(), "管道未能在宽限期内退出");
    }
}
