//! 积分账本服务入口
//!
//! 启动顺序：配置 -> 日志 -> 数据库（含迁移）-> 对账管道 -> HTTP 服务。
//! 停机顺序与之相反：HTTP 先停止接收新请求，对账管道在宽限期内退出，
//! 超时则记录错误并强制终止进程。

use std::sync::Arc;

use anyhow::Context;
use axum::{Json, Router, middleware, routing::get};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::compression::CompressionLayer;
use tracing::{error, info, warn};

use points_ledger_service::accrual::{AccrualClient, ReconciliationPipeline};
use points_ledger_service::auth::JwtManager;
use points_ledger_service::middleware::auth_middleware;
use points_ledger_service::repository::{LedgerStore, OrderRepository};
use points_ledger_service::{routes, state::AppState};
use points_shared::{
    config::AppConfig,
    database::Database,
    observability::{self, middleware as obs_middleware},
    retry::{RetryPolicy, retry_with_policy},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load("points-ledger-service").unwrap_or_default();

    observability::init(&config.service_name, &config.observability)?;

    info!("Starting points-ledger-service on {}", config.server_addr());

    // JWT 密钥：生产环境必须通过环境变量注入，开发环境允许默认值
    if config.auth.jwt_secret == points_shared::config::AuthConfig::default().jwt_secret {
        if config.is_production() {
            anyhow::bail!("生产环境必须设置 POINTS_AUTH_JWT_SECRET");
        }
        warn!("Using default JWT secret - set POINTS_AUTH_JWT_SECRET for production");
    }

    // 启动阶段连不上存储是致命错误；瞬时故障先按策略重试再放弃
    let db = retry_with_policy(
        &RetryPolicy::default(),
        "database_connect",
        points_shared::error::SharedError::is_retryable,
        || Database::connect(&config.database),
    )
    .await
    .context("failed to connect to database")?;

    sqlx::migrate!()
        .run(db.pool())
        .await
        .context("failed to run database migrations")?;
    info!("Database migrations applied");

    let jwt_manager = JwtManager::new(config.auth.clone());
    let state = AppState::new(db.pool().clone(), jwt_manager);

    // 启动对账管道：扫描器 + 工作者池，共享同一个取消令牌
    let cancel = CancellationToken::new();
    let ledger: Arc<dyn LedgerStore> = Arc::new(OrderRepository::new(db.pool().clone()));
    let accrual_client = Arc::new(
        AccrualClient::new(&config.accrual).context("failed to build accrual client")?,
    );
    let pipeline = ReconciliationPipeline::new(ledger, accrual_client, config.accrual.clone());
    let mut pipeline_tasks = pipeline.spawn(cancel.clone());

    let app = Router::new()
        .nest("/api/user", routes::api_routes())
        .route("/health", get(health_check))
        .route(
            "/ready",
            get({
                let db_for_ready = db.clone();
                move || readiness_check(db_for_ready.clone())
            }),
        )
        // 响应压缩：订单与流水列表可能较大
        .layer(CompressionLayer::new())
        // 认证中间件：验证 JWT Token
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        // 可观测性中间件：请求追踪和请求 ID
        .layer(middleware::from_fn(obs_middleware::http_tracing))
        .layer(middleware::from_fn(obs_middleware::request_id))
        .with_state(state);

    let listener = TcpListener::bind(config.server_addr()).await?;
    info!("Listening on {}", config.server_addr());

    // 优雅关闭：收到 SIGTERM 或 Ctrl+C 时停止接收新连接，
    // 同时取消令牌让扫描器停止生产、工作者停止领取新订单
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel.clone()))
        .await?;

    // HTTP 已停止，等待对账管道在宽限期内排空在途工作。
    // 卡死的网络调用不允许把进程挂住：超时即响亮地终止
    let grace = config.accrual.shutdown_grace();
    let drained = tokio::time::timeout(grace, async {
        while pipeline_tasks.join_next().await.is_some() {}
    })
    .await;

    if drained.is_err() {
        error!(
            grace_secs = grace.as_secs(),
            "对账管道未能在宽限期内退出，强制终止进程"
        );
        std::process::exit(1);
    }

    db.close().await;
    info!("Server shutdown complete");

    Ok(())
}

/// 监听关闭信号
///
/// K8s 通过 SIGTERM 通知 Pod 停止；本地开发通过 Ctrl+C。
/// 收到任一信号后先取消后台管道，再触发 axum 的优雅关闭流程。
async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("注册 Ctrl+C 处理器失败");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("注册 SIGTERM 处理器失败")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown..."),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown..."),
    }

    cancel.cancel();
}

/// 存活探针：服务进程正常即返回 ok
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "points-ledger-service"
    }))
}

/// 就绪探针：检查数据库连接是否可用
///
/// 就绪探针失败时负载均衡会把实例摘除，
/// 避免把流量路由到无法正常处理请求的实例
async fn readiness_check(db: Database) -> Json<serde_json::Value> {
    let db_ok = db.health_check().await.is_ok();

    Json(serde_json::json!({
        "status": if db_ok { "ok" } else { "degraded" },
        "service": "points-ledger-service",
        "checks": {
            "database": if db_ok { "ok" } else { "fail" }
        }
    }))
}
