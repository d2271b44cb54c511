//! 核算服务客户端
//!
//! 对外部核算服务做单次有界的 HTTP 查询，并把响应分类成
//! 判定 / 未受理 / 限流三种结果。客户端自身不保存任何跨调用状态，
//! 限流等待由共享的 `ThrottleGate` 管理。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::RETRY_AFTER;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use points_shared::config::AccrualConfig;

use crate::models::OrderStatus;

/// 核算客户端错误
#[derive(Debug, Error)]
pub enum AccrualError {
    #[error("请求核算服务失败: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("核算服务返回异常状态码: {0}")]
    UnexpectedStatus(u16),

    /// Retry-After 无法解析时不做任何默认猜测，当成错误暴露出来，
    /// 避免掩盖上游的异常行为
    #[error("Retry-After 响应头缺失或无效: {0:?}")]
    InvalidRetryAfter(Option<String>),

    #[error("响应体解析失败: {0}")]
    MalformedBody(String),

    #[error("未知的核算状态: {0}")]
    UnknownStatus(String),
}

/// 核算服务侧的订单状态枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccrualStatus {
    /// 已登记，尚未开始计算
    Registered,
    /// 计算中
    Processing,
    /// 判定为不产生积分
    Invalid,
    /// 计算完成
    Processed,
}

impl std::str::FromStr for AccrualStatus {
    type Err = AccrualError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "REGISTERED" => Ok(Self::Registered),
            "PROCESSING" => Ok(Self::Processing),
            "INVALID" => Ok(Self::Invalid),
            "PROCESSED" => Ok(Self::Processed),
            other => Err(AccrualError::UnknownStatus(other.to_string())),
        }
    }
}

impl From<AccrualStatus> for OrderStatus {
    fn from(status: AccrualStatus) -> Self {
        match status {
            AccrualStatus::Registered => Self::New,
            AccrualStatus::Processing => Self::Processing,
            AccrualStatus::Invalid => Self::Invalid,
            AccrualStatus::Processed => Self::Processed,
        }
    }
}

/// 核算服务返回的判定
///
/// status 保留原始字符串，映射到内部状态时才校验取值，
/// 未知取值按「该订单本轮跳过」处理而不是整个响应解析失败
#[derive(Debug, Clone, Deserialize)]
pub struct OrderVerdict {
    pub order: String,
    pub status: String,
    pub accrual: Option<Decimal>,
}

impl OrderVerdict {
    /// 把核算侧状态映射为账本订单状态
    pub fn order_status(&self) -> Result<OrderStatus, AccrualError> {
        let status: AccrualStatus = self.status.parse()?;
        Ok(status.into())
    }
}

/// 一次查询的分类结果
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// 2xx 且响应体可解析
    Verdict(OrderVerdict),
    /// 204：核算服务尚未受理该订单
    NotRegistered,
    /// 429：被限流，携带 Retry-After 等待时长
    Throttled(Duration),
}

/// 核算查询接口
///
/// 对账工作者依赖该抽象，测试中以 mock 替换真实 HTTP 客户端
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccrualFetch: Send + Sync {
    async fn order_status(&self, number: &str) -> Result<FetchOutcome, AccrualError>;
}

/// 基于 reqwest 的核算客户端
pub struct AccrualClient {
    http: reqwest::Client,
    base_url: String,
    route: String,
}

impl AccrualClient {
    /// 按配置构造客户端，单次请求超时由 reqwest 内建超时保证
    pub fn new(config: &AccrualConfig) -> Result<Self, AccrualError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            route: config.order_status_route.clone(),
        })
    }

    fn status_url(&self, number: &str) -> String {
        format!("{}{}", self.base_url, self.route.replace("{order}", number))
    }
}

#[async_trait]
impl AccrualFetch for AccrualClient {
    async fn order_status(&self, number: &str) -> Result<FetchOutcome, AccrualError> {
        let response = self.http.get(self.status_url(number)).send().await?;
        let status = response.status();

        if status == StatusCode::NO_CONTENT {
            return Ok(FetchOutcome::NotRegistered);
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let header = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned);
            let seconds = header
                .as_deref()
                .and_then(|v| v.trim().parse::<u64>().ok())
                .ok_or_else(|| AccrualError::InvalidRetryAfter(header.clone()))?;
            return Ok(FetchOutcome::Throttled(Duration::from_secs(seconds)));
        }

        if status.is_success() {
            let verdict = response
                .json::<OrderVerdict>()
                .await
                .map_err(|e| AccrualError::MalformedBody(e.to_string()))?;
            return Ok(FetchOutcome::Verdict(verdict));
        }

        Err(AccrualError::UnexpectedStatus(status.as_u16()))
    }
}
