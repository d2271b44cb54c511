//! 对账工作者
//!
//! 固定数量的消费者，从队列领取订单号并完成
//! 查询 -> 状态映射 -> 落库的完整处理。被限流的订单不会被丢弃：
//! 工作者把它留在本地重试槽位，等共享限流期结束后再处理——
//! 效果等同重新入队，又不会出现所有工作者同时阻塞在回灌队列上的死锁。

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::backoff::ThrottleGate;
use super::client::{AccrualFetch, FetchOutcome};
use crate::repository::LedgerStore;

/// 单个订单的处理结论
enum ProcessStep {
    /// 处理结束（成功、跳过或记录过错误），领取下一个订单
    Done,
    /// 被限流，等限流期结束后重试同一订单
    Retry,
    /// 收到取消信号，工作者退出
    Cancelled,
}

/// 对账工作者
pub struct Worker {
    id: usize,
    store: Arc<dyn LedgerStore>,
    fetcher: Arc<dyn AccrualFetch>,
    gate: Arc<ThrottleGate>,
    queue: Arc<Mutex<mpsc::Receiver<String>>>,
}

impl Worker {
    pub fn new(
        id: usize,
        store: Arc<dyn LedgerStore>,
        fetcher: Arc<dyn AccrualFetch>,
        gate: Arc<ThrottleGate>,
        queue: Arc<Mutex<mpsc::Receiver<String>>>,
    ) -> Self {
        Self {
            id,
            store,
            fetcher,
            gate,
            queue,
        }
    }

    /// 主循环：领取订单并处理，直到队列关闭或收到取消信号
    pub async fn run(self, cancel: CancellationToken) {
        debug!(worker = self.id, "对账工作者已启动");

        let mut retry_slot: Option<String> = None;

        loop {
            let number = match retry_slot.take() {
                Some(number) => number,
                None => match self.next_order(&cancel).await {
                    Some(number) => number,
                    None => break,
                },
            };

            // 处于限流期则先等待；取消信号也会在这里被观察到
            if !self.wait_out_throttle(&cancel).await {
                break;
            }

            match self.process_order(&number, &cancel).await {
                ProcessStep::Done => {}
                ProcessStep::Retry => retry_slot = Some(number),
                ProcessStep::Cancelled => break,
            }
        }

        debug!(worker = self.id, "对账工作者已退出");
    }

    /// 从队列领取下一个订单号
    ///
    /// 队列关闭（扫描器已退出）或收到取消信号时返回 None
    async fn next_order(&self, cancel: &CancellationToken) -> Option<String> {
        tokio::select! {
            _ = cancel.cancelled() => None,
            received = async { self.queue.lock().await.recv().await } => received,
        }
    }

    /// 等待共享限流期结束
    ///
    /// 返回 false 表示等待期间收到取消信号。睡醒后按快照清除限流：
    /// 多个工作者同时睡醒时只有一个清除成功，等待期间新产生的
    /// 限流轮次不会被误清。
    async fn wait_out_throttle(&self, cancel: &CancellationToken) -> bool {
        let episode = self.gate.snapshot();
        let Some(wait) = episode.remaining() else {
            return true;
        };

        info!(
            worker = self.id,
            wait_ms = wait.as_millis() as u64,
            episode = episode.id(),
            "核算服务限流中，等待后继续"
        );

        tokio::select! {
            _ = cancel.cancelled() => return false,
            _ = tokio::time::sleep(wait) => {}
        }

        self.gate.release(&episode);
        true
    }

    /// 处理单个订单：查询核算状态并把判定写回账本
    ///
    /// 除限流外的所有失败都只影响当前订单：记日志后继续领取下一个，
    /// 订单状态未推进，下一轮扫描自然会重试。
    async fn process_order(&self, number: &str, cancel: &CancellationToken) -> ProcessStep {
        debug!(worker = self.id, order = %number, "查询订单核算状态");

        // 网络查询可被取消；拿到判定之后的落库不再与取消竞争，
        // 保证单个订单内 查询 -> 映射 -> 落库 的顺序完整执行
        let outcome = tokio::select! {
            _ = cancel.cancelled() => return ProcessStep::Cancelled,
            outcome = self.fetcher.order_status(number) => outcome,
        };

        match outcome {
            Ok(FetchOutcome::Verdict(verdict)) => {
                let status = match verdict.order_status() {
                    Ok(status) => status,
                    Err(e) => {
                        warn!(order = %number, error = %e, "核算状态无法映射，本轮跳过该订单");
                        return ProcessStep::Done;
                    }
                };

                match self.store.apply_accrual(number, status, verdict.accrual).await {
                    Ok(()) => {
                        info!(order = %number, status = ?status, "订单核算结果已入账");
                    }
                    Err(e) => {
                        warn!(order = %number, error = %e, "核算结果落库失败，留待下轮扫描重试");
                    }
                }
                ProcessStep::Done
            }
            Ok(FetchOutcome::NotRegistered) => {
                debug!(order = %number, "核算服务尚未受理该订单");
                ProcessStep::Done
            }
            Ok(FetchOutcome::Throttled(wait)) => {
                info!(
                    worker = self.id,
                    order = %number,
                    wait_secs = wait.as_secs(),
                    "核算服务限流，暂停所有工作者后重试该订单"
                );
                self.gate.engage(wait);
                ProcessStep::Retry
            }
            Err(e) => {
                warn!(order = %number, error = %e, "查询核算状态失败，本轮跳过该订单");
                ProcessStep::Done
            }
        }
    }
}
