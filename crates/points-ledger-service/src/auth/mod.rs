//! 认证模块
//!
//! 提供 JWT Token 的生成验证和密码哈希功能

pub mod jwt;
pub mod password;

pub use jwt::{Claims, JwtManager};
pub use password::{hash_password, verify_password};
