//! 账户数据模型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

/// 账户（存储模型，包含密码哈希）
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// 账户唯一 ID (UUID)
    pub id: String,
    /// 登录名（唯一）
    pub login: String,
    /// bcrypt 哈希后的密码
    pub password_hash: String,
    /// 邮箱地址（激活和重置邮件的收件人）
    pub email: String,
    /// 名
    pub name: Option<String>,
    /// 姓
    pub surname: Option<String>,
    /// 是否已通过邮件激活
    #[serde(default)]
    pub activated: bool,
    /// 是否有未完成的密码重置
    #[serde(default)]
    pub reset_password_pending: bool,
    /// 创建时间
    pub created_at: Option<DateTime<Utc>>,
    /// 更新时间
    pub updated_at: Option<DateTime<Utc>>,
}

/// 注册请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub login: String,
    pub password: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub surname: Option<String>,
}

/// 登录请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

/// 密码重置确认请求（重复输入以防手误）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetConfirmRequest {
    pub newpass: String,
    pub newpass2: String,
}

/// Token 用途
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    /// 会话 token（访问受保护接口）
    Session,
    /// 激活 token（仅用于确认注册）
    Activation,
    /// 重置 token（仅用于确认密码重置）
    PasswordReset,
}

/// JWT Claims 结构
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject: 账户 ID
    pub sub: String,
    /// 登录名
    pub login: String,
    /// JWT issuer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    /// JWT audience
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    /// Token 用途（消费端必须校验）
    pub purpose: TokenPurpose,
    /// 过期时间戳 (Unix timestamp)
    pub exp: i64,
    /// 签发时间戳 (Unix timestamp)
    pub iat: i64,
}

/// 登录响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionToken {
    /// 会话 token (JWT)
    pub token: String,
    /// 过期时间（秒）
    pub expires_in: i64,
    /// Token 类型
    pub token_type: String,
}

/// 注册结果：新账户与待邮寄的激活 token
#[derive(Debug, Clone)]
pub struct Registration {
    pub account: Account,
    pub activation_token: String,
}

/// 重置请求结果：目标账户与待邮寄的重置 token
#[derive(Debug, Clone)]
pub struct ResetRequest {
    pub account: Account,
    pub reset_token: String,
}

/// 账户摘要（不含敏感信息）
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSummary {
    pub id: String,
    pub login: String,
    pub email: String,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub activated: bool,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<Account> for AccountSummary {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            login: account.login,
            email: account.email,
            name: account.name,
            surname: account.surname,
            activated: account.activated,
            created_at: account.created_at,
        }
    }
}
