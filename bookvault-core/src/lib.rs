//! Core library for account management: credential hashing, token issuance and
//! verification, the account lifecycle, and book storage.

pub mod account;
mod config;
mod error;
pub mod library;

pub use account::{
    Account, AccountFilter, AccountManager, AccountStore, AccountSummary, LoginRequest,
    RegisterRequest, Registration, ResetConfirmRequest, ResetRequest, SessionToken, TokenClaims,
    TokenPurpose,
};
pub use config::{AuthConfig, DEFAULT_BCRYPT_COST};
pub use error::{CoreError, Result};
pub use library::{Book, BookStore, CreateBookRequest, UpdateBookRequest};
