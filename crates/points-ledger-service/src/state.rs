//! 应用状态定义
//!
//! 包含 Axum 路由共享的应用状态

use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::JwtManager;
use crate::repository::{BalanceRepository, OrderRepository, UserRepository};

/// Axum 应用共享状态
///
/// 仓储与 JWT 管理器通过 Arc 在 handler 间共享
#[derive(Clone)]
pub struct AppState {
    /// JWT 管理器
    pub jwt_manager: Arc<JwtManager>,
    /// 用户仓储
    pub users: Arc<UserRepository>,
    /// 订单仓储
    pub orders: Arc<OrderRepository>,
    /// 余额仓储
    pub balances: Arc<BalanceRepository>,
}

impl AppState {
    /// 基于连接池和 JWT 管理器创建应用状态
    pub fn new(pool: PgPool, jwt_manager: JwtManager) -> Self {
        Self {
            jwt_manager: Arc::new(jwt_manager),
            users: Arc::new(UserRepository::new(pool.clone())),
            orders: Arc::new(OrderRepository::new(pool.clone())),
            balances: Arc::new(BalanceRepository::new(pool)),
        }
    }
}
