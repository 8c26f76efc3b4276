//! 账户子系统：注册、激活、登录与密码重置

mod crypto;
mod manager;
mod models;
mod store;
mod tokens;

pub use manager::AccountManager;
pub use models::{
    Account, AccountSummary, LoginRequest, RegisterRequest, Registration, ResetConfirmRequest,
    ResetRequest, SessionToken, TokenClaims, TokenPurpose,
};
pub use store::{AccountFilter, AccountStore};
