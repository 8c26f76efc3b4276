use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bookvault_core::CoreError;
use serde_json::json;

#[derive(Debug)]
pub struct ApiError {
    code: &'static str,
    message: String,
    status: StatusCode,
}

impl ApiError {
    pub fn new(code: &'static str, status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code,
            status,
            message: message.into(),
        }
    }

    pub fn unauthorized() -> Self {
        Self::new("Unauthorized", StatusCode::UNAUTHORIZED, "unauthorized")
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("Forbidden", StatusCode::FORBIDDEN, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("BadRequest", StatusCode::BAD_REQUEST, message)
    }

    pub fn too_many_requests(message: impl Into<String>) -> Self {
        Self::new("TooManyRequests", StatusCode::TOO_MANY_REQUESTS, message)
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(msg) => {
                ApiError::new("ValidationError", StatusCode::BAD_REQUEST, msg)
            }
            CoreError::DuplicateLogin(login) => ApiError::new(
                "DuplicateLogin",
                StatusCode::CONFLICT,
                format!("login {login} already taken"),
            ),
            CoreError::AccountNotFound(what) => ApiError::new(
                "AccountNotFound",
                StatusCode::NOT_FOUND,
                format!("account {what} not found"),
            ),
            CoreError::BookNotFound(id) => ApiError::new(
                "BookNotFound",
                StatusCode::NOT_FOUND,
                format!("book {id} not found"),
            ),
            CoreError::InvalidCredentials => ApiError::new(
                "InvalidCredentials",
                StatusCode::UNAUTHORIZED,
                "invalid credentials",
            ),
            CoreError::InvalidToken(msg) => {
                tracing::warn!(error = %msg, "token rejected");
                ApiError::new(
                    "Forbidden",
                    StatusCode::FORBIDDEN,
                    "invalid or expired token",
                )
            }
            CoreError::PasswordMismatch => ApiError::new(
                "PasswordMismatch",
                StatusCode::BAD_REQUEST,
                "passwords do not match",
            ),
            // 内部错误不向客户端暴露细节
            CoreError::Io(e) => {
                tracing::error!(error = %e, "io error");
                ApiError::new(
                    "InternalError",
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error",
                )
            }
            CoreError::Serde(e) => {
                tracing::error!(error = %e, "serde error");
                ApiError::new(
                    "InternalError",
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error",
                )
            }
            CoreError::Other(msg) => {
                tracing::error!(error = %msg, "internal error");
                ApiError::new(
                    "InternalError",
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error",
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "code": self.code,
            "message": self.message,
        }));
        (self.status, body).into_response()
    }
}
