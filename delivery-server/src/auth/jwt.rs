//! JWT 令牌服务
//!
//! 只做验证和（为外部认证层/测试准备的）签发。登录、口令校验等认证
//! 机制不在本服务内。

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::utils::AppError;

/// Driver role string
pub const ROLE_DRIVER: &str = "driver";
/// Admin roles accepted on the admin surface
pub const ADMIN_ROLES: &[&str] = &["admin", "support"];

/// 存储在令牌中的 JWT Claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// 用户 ID (Subject), "user:…" 形式
    pub sub: String,
    /// 角色: driver | admin | support
    pub role: String,
    /// 过期时间戳
    pub exp: i64,
    /// 签发时间戳
    pub iat: i64,
}

/// JWT 错误
#[derive(Error, Debug)]
pub enum JwtError {
    #[error("无效令牌: {0}")]
    InvalidToken(String),

    #[error("令牌已过期")]
    ExpiredToken,

    #[error("令牌生成失败: {0}")]
    GenerationFailed(String),
}

impl From<JwtError> for AppError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::ExpiredToken | JwtError::InvalidToken(_) => AppError::InvalidToken,
            JwtError::GenerationFailed(msg) => AppError::Internal(msg),
        }
    }
}

/// JWT 令牌服务
pub struct JwtService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    expiration_minutes: i64,
}

impl JwtService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            expiration_minutes: std::env::var("JWT_EXPIRATION_MINUTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(60 * 24 * 7), // 默认 7 天
        }
    }

    /// 签发令牌 (由外部认证层调用；测试也用它铸造身份)
    pub fn sign(&self, user_id: &str, role: &str) -> Result<String, JwtError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            role: role.to_string(),
            exp: now + self.expiration_minutes * 60,
            iat: now,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| JwtError::GenerationFailed(e.to_string()))
    }

    /// 验证令牌并取出 Claims
    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
                _ => JwtError::InvalidToken(e.to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_and_verify_roundtrip() {
        let service = JwtService::new("test-secret");
        let token = service.sign("user:driver1", ROLE_DRIVER).unwrap();
        let claims = service.verify(&token).unwrap();
        assert_eq!(claims.sub, "user:driver1");
        assert_eq!(claims.role, "driver");
    }

    #[test]
    fn verify_rejects_wrong_secret() {
        let signer = JwtService::new("secret-a");
        let verifier = JwtService::new("secret-b");
        let token = signer.sign("user:driver1", ROLE_DRIVER).unwrap();
        assert!(matches!(
            verifier.verify(&token),
            Err(JwtError::InvalidToken(_))
        ));
    }

    #[test]
    fn verify_rejects_garbage() {
        let service = JwtService::new("test-secret");
        assert!(service.verify("not.a.token").is_err());
    }
}
