//! 限流闸门
//!
//! 核算服务的限流几乎总是全局的，一次 429 应让所有工作者一起暂停。
//! 共享状态建模为原子交换的不可变快照（轮次 id + 截止时刻），
//! 工作者拿到快照后等待、再按指针身份做比较交换来清除：
//! 同一轮限流只会被清除一次，期间产生的新一轮限流不会被旧的清除误伤。

use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::time::{Duration, Instant};

/// 一轮限流的不可变快照
#[derive(Debug)]
pub struct ThrottleEpisode {
    id: u64,
    deadline: Option<Instant>,
}

impl ThrottleEpisode {
    /// 距离本轮限流结束还需等待的时间
    ///
    /// 未处于限流期（或截止时刻已过）返回 None
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline.and_then(|deadline| {
            let now = Instant::now();
            if deadline > now { Some(deadline - now) } else { None }
        })
    }

    /// 限流轮次编号，每次进入新一轮限流时递增
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// 工作者共享的限流闸门
pub struct ThrottleGate {
    episode: ArcSwap<ThrottleEpisode>,
}

impl ThrottleGate {
    pub fn new() -> Self {
        Self {
            episode: ArcSwap::from_pointee(ThrottleEpisode {
                id: 0,
                deadline: None,
            }),
        }
    }

    /// 读取当前限流快照
    pub fn snapshot(&self) -> Arc<ThrottleEpisode> {
        self.episode.load_full()
    }

    /// 进入新一轮限流，所有工作者在 wait 时间内不得发起新的查询
    ///
    /// 使用 rcu 保证并发触发时轮次编号单调递增、互不覆盖
    pub fn engage(&self, wait: Duration) {
        let deadline = Instant::now() + wait;
        self.episode.rcu(|current| {
            Arc::new(ThrottleEpisode {
                id: current.id + 1,
                deadline: Some(deadline),
            })
        });
    }

    /// 清除观察到的那一轮限流
    ///
    /// 按指针身份比较交换：只有当前快照仍是 observed 时才清除，
    /// 因此每轮限流至多被清除一次，期间新产生的限流轮次不受影响。
    /// 返回是否由本次调用完成了清除。
    pub fn release(&self, observed: &Arc<ThrottleEpisode>) -> bool {
        let cleared = Arc::new(ThrottleEpisode {
            id: observed.id,
            deadline: None,
        });
        let previous = self.episode.compare_and_swap(observed, cleared);
        Arc::ptr_eq(&*previous, observed)
    }
}

impl Default for ThrottleGate {
    fn default() -> Self {
        Self::new()
    }
}
