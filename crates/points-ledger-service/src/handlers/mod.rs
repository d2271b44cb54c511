//! HTTP 请求处理器
//!
//! 注册/登录、订单上传与查询、余额查询与提现、提现流水

pub mod auth;
pub mod balance;
pub mod orders;
pub mod withdrawals;
