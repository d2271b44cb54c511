//! 订单模型
//!
//! 订单状态机：NEW -> PROCESSING -> {INVALID | PROCESSED}。
//! INVALID 和 PROCESSED 为终态，达到终态的订单不再被对账管道触碰。

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 订单状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// 新建 - 已提交，核算服务尚未开始处理
    #[default]
    New,
    /// 处理中 - 核算服务正在计算
    Processing,
    /// 无效 - 核算服务判定不产生积分（终态）
    Invalid,
    /// 已完成 - 核算完毕，积分已入账（终态）
    Processed,
}

impl OrderStatus {
    /// 是否为终态
    ///
    /// 终态订单的状态与积分永远不会再变化
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Invalid | Self::Processed)
    }

    /// 该状态是否产生积分入账
    pub fn earns_bonus(&self) -> bool {
        matches!(self, Self::Processed)
    }
}

/// 订单实体
///
/// user_id 仅服务内部使用，不随 API 响应返回
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Order {
    pub number: String,
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    pub status: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accrual: Option<Decimal>,
    pub uploaded_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_statuses() {
        assert!(!OrderStatus::New.is_terminal());
        assert!(!OrderStatus::Processing.is_terminal());
        assert!(OrderStatus::Invalid.is_terminal());
        assert!(OrderStatus::Processed.is_terminal());
    }

    #[test]
    fn test_only_processed_earns_bonus() {
        assert!(OrderStatus::Processed.earns_bonus());
        assert!(!OrderStatus::New.earns_bonus());
        assert!(!OrderStatus::Processing.earns_bonus());
        assert!(!OrderStatus::Invalid.earns_bonus());
    }

    #[test]
    fn test_status_serde_wire_names() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Processed).unwrap(),
            "\"PROCESSED\""
        );
        let status: OrderStatus = serde_json::from_str("\"NEW\"").unwrap();
        assert_eq!(status, OrderStatus::New);
    }

    #[test]
    fn test_order_serialization_hides_user_id() {
        let order = Order {
            number: "79927398713".to_string(),
            user_id: Uuid::new_v4(),
            status: OrderStatus::Processed,
            accrual: Some(Decimal::new(1505, 1)),
            uploaded_at: Utc::now(),
        };

        let json = serde_json::to_value(&order).unwrap();
        assert!(json.get("user_id").is_none());
        assert_eq!(json["number"], "79927398713");
        assert_eq!(json["status"], "PROCESSED");
    }

    #[test]
    fn test_order_serialization_omits_missing_accrual() {
        let order = Order {
            number: "79927398713".to_string(),
            user_id: Uuid::new_v4(),
            status: OrderStatus::New,
            accrual: None,
            uploaded_at: Utc::now(),
        };

        let json = serde_json::to_value(&order).unwrap();
        assert!(json.get("accrual").is_none());
    }
}
