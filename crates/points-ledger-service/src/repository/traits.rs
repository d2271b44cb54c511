//! 仓储 Trait 定义
//!
//! 定义对账管道依赖的账本接口，便于管道依赖抽象而非具体实现，支持 mock 测试

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::Result;
use crate::models::OrderStatus;

/// 账本存储接口
///
/// 对账管道消费的唯一存储抽象：
/// - `list_pending_orders` 返回尚未达到终态的订单号；
/// - `apply_accrual` 在单个事务内更新订单行，并在订单进入 PROCESSED 时
///   为其所有者的余额加上对应积分。对已达终态的订单必须是安全的空操作，
///   这是"积分至多入账一次"不变量的落点。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn list_pending_orders(&self) -> Result<Vec<String>>;

    async fn apply_accrual(
        &self,
        number: &str,
        status: OrderStatus,
        accrual: Option<Decimal>,
    ) -> Result<()>;
}
