//! 领域模型定义
//!
//! 订单、余额、提现与用户的实体类型，以及订单号的 Luhn 校验。

pub mod balance;
pub mod luhn;
pub mod order;
pub mod user;

pub use balance::{Balance, Withdrawal};
pub use order::{Order, OrderStatus};
pub use user::User;
