//! 积分账本服务
//!
//! 用户上传订单号换取积分：外部核算服务异步计算每个订单的积分，
//! 后台对账管道把核算结果同步回账本；REST API 提供注册登录、
//! 订单上传查询、余额查询与提现。
//!
//! ## 模块结构
//!
//! - `accrual`: 对账管道（扫描器、工作者池、核算客户端、限流闸门）
//! - `auth`: JWT 与密码处理
//! - `error`: 错误类型定义
//! - `handlers`: HTTP 请求处理器
//! - `middleware`: 认证中间件
//! - `models`: 领域模型与 Luhn 校验
//! - `repository`: PostgreSQL 仓储层
//! - `routes`: 路由配置
//! - `state`: 应用状态
//!
//! ## 技术栈
//!
//! - Web 框架：Axum
//! - 存储：sqlx + PostgreSQL
//! - 外部调用：reqwest

pub mod accrual;
pub mod auth;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod routes;
pub mod state;

// 重新导出核心类型
pub use accrual::{AccrualClient, AccrualFetch, ReconciliationPipeline, ThrottleGate};
pub use error::{Result, ServiceError};
pub use models::{Balance, Order, OrderStatus, User, Withdrawal};
pub use repository::{BalanceRepository, LedgerStore, OrderRepository, UserRepository};
pub use state::AppState;
