use thiserror::Error;

/// Common result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("login already taken: {0}")]
    DuplicateLogin(String),
    #[error("account not found: {0}")]
    AccountNotFound(String),
    #[error("book not found: {0}")]
    BookNotFound(String),
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("invalid or expired token: {0}")]
    InvalidToken(String),
    #[error("password confirmation mismatch")]
    PasswordMismatch,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("other error: {0}")]
    Other(String),
}
