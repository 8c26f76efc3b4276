//! JWT 签发与验证：无状态 token，claims 携带用途声明

use super::models::*;
use super::AccountManager;
use crate::error::{CoreError, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

impl AccountManager {
    /// 签发指定用途的 token，有效期按用途从配置读取
    pub fn issue_token(&self, account: &Account, purpose: TokenPurpose) -> Result<String> {
        let ttl_hours = match purpose {
            TokenPurpose::Session => self.config.session_ttl_hours,
            TokenPurpose::Activation => self.config.activation_ttl_hours,
            TokenPurpose::PasswordReset => self.config.reset_ttl_hours,
        };
        let now = Utc::now();
        let claims = TokenClaims {
            sub: account.id.clone(),
            login: account.login.clone(),
            iss: Some(self.config.jwt_issuer.clone()),
            aud: Some(self.config.jwt_audience.clone()),
            purpose,
            exp: (now + Duration::hours(ttl_hours)).timestamp(),
            iat: now.timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| CoreError::Other(format!("jwt encode failed: {}", e)))
    }

    /// 验证 token 签名、有效期与用途声明。
    /// 用途不符的 token 一律拒绝，激活 token 不能当会话 token 用。
    pub fn verify_token(&self, token: &str, expected: TokenPurpose) -> Result<TokenClaims> {
        let mut validation = Validation::default();
        // 过期即拒绝，不留余量
        validation.leeway = 0;
        validation.set_audience(&[self.config.jwt_audience.clone()]);
        validation.set_issuer(&[self.config.jwt_issuer.clone()]);

        let token_data = decode::<TokenClaims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| CoreError::InvalidToken(e.to_string()))?;

        let claims = token_data.claims;
        // 解码器只拒绝 exp < now；边界上 exp == now 也按过期处理
        if claims.exp <= Utc::now().timestamp() {
            return Err(CoreError::InvalidToken("token expired".to_string()));
        }
        if claims.purpose != expected {
            return Err(CoreError::InvalidToken(format!(
                "unexpected token purpose: {:?}",
                claims.purpose
            )));
        }

        Ok(claims)
    }

    /// 生成登录响应用的会话令牌
    pub(super) fn session_token(&self, account: &Account) -> Result<SessionToken> {
        let token = self.issue_token(account, TokenPurpose::Session)?;
        Ok(SessionToken {
            token,
            expires_in: self.config.session_ttl_hours * 3600,
            token_type: "Bearer".to_string(),
        })
    }
}
