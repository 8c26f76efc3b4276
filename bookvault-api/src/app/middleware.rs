use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, Request};
use axum::middleware::Next;
use axum::response::Response;
use bookvault_core::{TokenClaims, TokenPurpose};

use super::error::ApiError;
use super::state::AppState;

/// 认证信息扩展
#[derive(Debug, Clone)]
pub struct AuthInfo {
    pub claims: TokenClaims,
}

/// 不需要会话认证的路径
const PUBLIC_PATHS: &[&str] = &[
    "/health",
    "/register",
    "/registerconfirm",
    "/login",
    "/resetpassword",
    "/resetconfirm",
];

/// 从 Authorization header 提取 Bearer token
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.to_string())
}

/// 会话认证中间件。
/// 缺少 token 返回 401，token 无效或用途不符返回 403。
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let path = request.uri().path().to_string();

    // 公开端点不需要认证
    if PUBLIC_PATHS.iter().any(|p| path == *p) {
        return Ok(next.run(request).await);
    }

    let token = bearer_token(request.headers()).ok_or_else(ApiError::unauthorized)?;

    // 只接受会话 token；激活/重置 token 一律拒绝
    let claims = match state.accounts.verify_token(&token, TokenPurpose::Session) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(path = %path, error = %e, "session token rejected");
            return Err(ApiError::forbidden("invalid or expired session token"));
        }
    };

    request.extensions_mut().insert(AuthInfo { claims });
    Ok(next.run(request).await)
}
