use bookvault_core::{AccountManager, BookStore};
use std::sync::Arc;

use super::mailer::Mailer;

/// Shared application state for handlers.
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<AccountManager>,
    pub books: Arc<BookStore>,
    /// 激活与重置邮件发送器
    pub mailer: Arc<Mailer>,
    /// 登录接口限流（按 IP）
    pub login_limiter: Arc<crate::app::RateLimiter>,
    /// 密码重置接口限流（按 IP）
    pub reset_limiter: Arc<crate::app::RateLimiter>,
}
