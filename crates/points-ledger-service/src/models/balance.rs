//! 余额与提现模型

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// 用户积分余额
///
/// current 为可用积分，withdrawn 为累计提现积分。
/// 数据库层有 current >= 0 的约束兜底。
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Balance {
    pub current: Decimal,
    pub withdrawn: Decimal,
}

/// 提现流水记录
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Withdrawal {
    #[serde(rename = "order")]
    pub order_number: String,
    pub sum: Decimal,
    pub processed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_withdrawal_serializes_order_field_name() {
        let withdrawal = Withdrawal {
            order_number: "2377225624".to_string(),
            sum: Decimal::new(500, 0),
            processed_at: Utc::now(),
        };

        let json = serde_json::to_value(&withdrawal).unwrap();
        assert_eq!(json["order"], "2377225624");
        assert!(json.get("order_number").is_none());
        assert_eq!(json["sum"].as_f64(), Some(500.0));
    }
}
