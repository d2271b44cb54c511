//! JWT Token 处理
//!
//! 提供 JWT Token 的生成和验证功能

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use points_shared::config::AuthConfig;

use crate::error::ServiceError;

/// JWT Claims（Token 载荷）
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// 用户 ID
    pub sub: String,
    /// 登录名
    pub login: String,
    /// 签发时间
    pub iat: i64,
    /// 过期时间
    pub exp: i64,
    /// 签发者
    pub iss: String,
}

impl Claims {
    /// 解析载荷中的用户 ID
    pub fn user_id(&self) -> Result<Uuid, ServiceError> {
        self.sub
            .parse()
            .map_err(|_| ServiceError::Unauthorized("无效的用户标识".to_string()))
    }
}

/// JWT 管理器
#[derive(Clone)]
pub struct JwtManager {
    config: AuthConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtManager {
    /// 创建 JWT 管理器
    pub fn new(config: AuthConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// 生成 JWT Token
    ///
    /// 返回 (token, 过期时间戳)
    pub fn generate_token(
        &self,
        user_id: Uuid,
        login: &str,
    ) -> Result<(String, i64), ServiceError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.config.token_expires_secs);

        let claims = Claims {
            sub: user_id.to_string(),
            login: login.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            iss: self.config.issuer.clone(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| ServiceError::Internal(format!("JWT 生成失败: {}", e)))?;

        Ok((token, exp.timestamp()))
    }

    /// 验证并解析 JWT Token
    ///
    /// 返回解析后的 Claims，如果 Token 无效或过期则返回错误
    pub fn verify_token(&self, token: &str) -> Result<Claims, ServiceError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.config.issuer]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(
            |e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    ServiceError::Unauthorized("Token 已过期".to_string())
                }
                jsonwebtoken::errors::ErrorKind::InvalidToken => {
                    ServiceError::Unauthorized("无效的 Token".to_string())
                }
                _ => ServiceError::Unauthorized(format!("Token 验证失败: {}", e)),
            },
        )?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_manager() -> JwtManager {
        JwtManager::new(AuthConfig::default())
    }

    #[test]
    fn test_generate_and_verify_token() {
        let manager = test_manager();
        let user_id = Uuid::new_v4();

        let (token, _exp) = manager.generate_token(user_id, "alice").unwrap();

        let claims = manager.verify_token(&token).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.login, "alice");
        assert_eq!(claims.user_id().unwrap(), user_id);
    }

    #[test]
    fn test_invalid_token() {
        let manager = test_manager();

        let result = manager.verify_token("invalid.token.here");
        assert!(result.is_err());
    }

    #[test]
    fn test_token_from_other_secret_rejected() {
        let manager = test_manager();
        let other = JwtManager::new(AuthConfig {
            jwt_secret: "another-secret".to_string(),
            ..AuthConfig::default()
        });

        let (token, _) = other.generate_token(Uuid::new_v4(), "bob").unwrap();
        assert!(manager.verify_token(&token).is_err());
    }

    #[test]
    fn test_claims_user_id_parse_failure() {
        let claims = Claims {
            sub: "not-a-uuid".to_string(),
            login: "alice".to_string(),
            iat: 0,
            exp: 0,
            iss: "points-ledger-service".to_string(),
        };
        assert!(claims.user_id().is_err());
    }
}
