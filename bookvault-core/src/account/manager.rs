//! 账户管理器：注册、激活、登录与密码重置的生命周期操作

use super::crypto::{hash_password, verify_password};
use super::models::*;
use super::store::{AccountFilter, AccountStore};
use crate::config::AuthConfig;
use crate::error::{CoreError, Result};
use chrono::Utc;
use std::path::Path;
use tracing::{info, instrument, warn};

/// 账户管理器
#[derive(Debug)]
pub struct AccountManager {
    /// 账户存储
    pub(super) store: AccountStore,
    /// 认证配置
    pub(super) config: AuthConfig,
}

// ============================================================================
// 构造器和内部辅助方法
// ============================================================================

impl AccountManager {
    /// 打开数据目录并创建账户管理器
    pub async fn open<P: AsRef<Path>>(data_dir: P, config: AuthConfig) -> Result<Self> {
        let store = AccountStore::open(data_dir).await?;
        Ok(Self { store, config })
    }

    /// 校验注册字段（只查必填项，不做强度策略）
    fn validate_registration(req: &RegisterRequest) -> Result<()> {
        if req.login.trim().is_empty() {
            return Err(CoreError::Validation("login must not be empty".into()));
        }
        if req.password.is_empty() {
            return Err(CoreError::Validation("password must not be empty".into()));
        }
        if req.email.trim().is_empty() || !req.email.contains('@') {
            return Err(CoreError::Validation("email address is invalid".into()));
        }
        Ok(())
    }
}

// ============================================================================
// 注册与激活
// ============================================================================

impl AccountManager {
    /// 注册新账户：哈希密码、落盘、签发激活 token。
    /// 登录名查重在存储层临界区内完成。
    #[instrument(skip(self, req))]
    pub async fn register(&self, req: RegisterRequest) -> Result<Registration> {
        Self::validate_registration(&req)?;
        let password_hash = hash_password(&req.password, self.config.bcrypt_cost).await?;

        let now = Utc::now();
        let account = Account {
            id: uuid::Uuid::new_v4().to_string(),
            login: req.login,
            password_hash,
            email: req.email,
            name: req.name,
            surname: req.surname,
            activated: false,
            reset_password_pending: false,
            created_at: Some(now),
            updated_at: Some(now),
        };

        let account = self.store.insert(account).await?;
        let activation_token = self.issue_token(&account, TokenPurpose::Activation)?;

        info!(account_id = %account.id, login = %account.login, "registered account");
        Ok(Registration {
            account,
            activation_token,
        })
    }

    /// 确认激活：验证激活 token 并置位 activated。重复确认是幂等的。
    #[instrument(skip(self, token))]
    pub async fn confirm_activation(&self, token: &str) -> Result<Account> {
        let claims = self.verify_token(token, TokenPurpose::Activation)?;

        let updated = self
            .store
            .update_one(AccountFilter::ById(&claims.sub), |account| {
                account.activated = true;
            })
            .await?;
        let account = updated.ok_or_else(|| CoreError::AccountNotFound(claims.sub.clone()))?;

        info!(account_id = %account.id, login = %account.login, "account activated");
        Ok(account)
    }
}

// ============================================================================
// 登录
// ============================================================================

impl AccountManager {
    /// 账户登录。未知登录名和密码错误返回同一个错误，
    /// 不向调用方泄露账户是否存在。
    #[instrument(skip(self, password))]
    pub async fn login(&self, login: &str, password: &str) -> Result<SessionToken> {
        let Some(account) = self.store.find(AccountFilter::ByLogin(login)).await else {
            warn!(login = %login, "login failed: unknown login");
            return Err(CoreError::InvalidCredentials);
        };

        // 验证密码
        let valid = verify_password(password, &account.password_hash).await?;
        if !valid {
            warn!(login = %login, "login failed: invalid password");
            return Err(CoreError::InvalidCredentials);
        }

        info!(account_id = %account.id, login = %login, "account logged in");
        self.session_token(&account)
    }

    /// 获取账户
    pub async fn get_account(&self, id: &str) -> Result<Account> {
        self.store
            .find(AccountFilter::ById(id))
            .await
            .ok_or_else(|| CoreError::AccountNotFound(id.to_string()))
    }
}

// ============================================================================
// 密码重置
// ============================================================================

impl AccountManager {
    /// 发起密码重置：按邮箱定位账户，置位 pending 并签发重置 token
    #[instrument(skip(self))]
    pub async fn request_password_reset(&self, email: &str) -> Result<ResetRequest> {
        let updated = self
            .store
            .update_one(AccountFilter::ByEmail(email), |account| {
                account.reset_password_pending = true;
            })
            .await?;
        let account =
            updated.ok_or_else(|| CoreError::AccountNotFound(format!("email: {}", email)))?;

        let reset_token = self.issue_token(&account, TokenPurpose::PasswordReset)?;

        info!(account_id = %account.id, "password reset requested");
        Ok(ResetRequest {
            account,
            reset_token,
        })
    }

    /// 完成密码重置：校验重置 token 与两次输入，
    /// 哈希新密码并清除 pending 标记
    #[instrument(skip_all)]
    pub async fn confirm_password_reset(
        &self,
        token: &str,
        newpass: &str,
        newpass2: &str,
    ) -> Result<Account> {
        let claims = self.verify_token(token, TokenPurpose::PasswordReset)?;

        if newpass.is_empty() {
            return Err(CoreError::Validation("password must not be empty".into()));
        }
        if newpass != newpass2 {
            return Err(CoreError::PasswordMismatch);
        }

        let password_hash = hash_password(newpass, self.config.bcrypt_cost).await?;
        let updated = self
            .store
            .update_one(AccountFilter::ById(&claims.sub), |account| {
                account.password_hash = password_hash;
                account.reset_password_pending = false;
            })
            .await?;
        let account = updated.ok_or_else(|| CoreError::AccountNotFound(claims.sub.clone()))?;

        info!(account_id = %account.id, "password reset completed");
        Ok(account)
    }
}
