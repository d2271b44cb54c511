//! 路由配置模块
//!
//! 定义所有 REST API 端点的路由映射

use axum::{
    Router,
    routing::{get, post},
};

use crate::{handlers, state::AppState};

/// 构建用户侧 API 路由
///
/// 返回不含前缀的路由表，由调用方在 main.rs 中挂载到 /api/user
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/orders", post(handlers::orders::create_order))
        .route("/orders", get(handlers::orders::list_orders))
        .route("/balance", get(handlers::balance::get_balance))
        .route("/balance/withdraw", post(handlers::balance::withdraw))
        .route("/withdrawals", get(handlers::withdrawals::list_withdrawals))
}
