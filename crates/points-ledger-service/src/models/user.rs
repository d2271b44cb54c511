//! 用户模型

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// 数据库用户记录
///
/// password_hash 为 bcrypt 哈希，永远不进入任何响应
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub login: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}
