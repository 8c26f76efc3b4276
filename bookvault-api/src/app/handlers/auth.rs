//! 认证相关 API handlers：注册、激活、登录、密码重置

use axum::extract::{ConnectInfo, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::{Extension, Json};
use bookvault_core::{
    AccountSummary, LoginRequest, RegisterRequest, ResetConfirmRequest, SessionToken,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::SocketAddr;

use super::super::error::ApiError;
use super::super::middleware::{bearer_token, AuthInfo};
use super::super::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ConfirmQuery {
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResetQuery {
    email: Option<String>,
}

fn client_ip(addr: Option<ConnectInfo<SocketAddr>>) -> String {
    addr.map(|ConnectInfo(a)| a.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// POST /register - 注册新账户并邮寄激活链接
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AccountSummary>), ApiError> {
    if req.login.is_empty() {
        return Err(ApiError::bad_request("login is required"));
    }
    if req.password.is_empty() {
        return Err(ApiError::bad_request("password is required"));
    }

    // 字段校验和登录名查重由 core 层执行
    let registration = state.accounts.register(req).await?;
    state.mailer.send_activation(
        &registration.account.email,
        &registration.account.login,
        &registration.activation_token,
    );

    Ok((StatusCode::CREATED, Json(registration.account.into())))
}

/// GET /registerconfirm?token= - 用激活 token 确认注册
pub async fn confirm_registration(
    State(state): State<AppState>,
    Query(query): Query<ConfirmQuery>,
) -> Result<Json<AccountSummary>, ApiError> {
    let token = query
        .token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::bad_request("token query parameter is required"))?;

    let account = state.accounts.confirm_activation(&token).await?;
    Ok(Json(account.into()))
}

/// POST /login - 账户登录
pub async fn login(
    State(state): State<AppState>,
    addr: Option<ConnectInfo<SocketAddr>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<SessionToken>, ApiError> {
    let ip = client_ip(addr);
    if !state.login_limiter.allow(&ip).await {
        return Err(ApiError::too_many_requests(
            "too many login attempts, try again later",
        ));
    }

    let session = state.accounts.login(&req.login, &req.password).await?;
    Ok(Json(session))
}

/// GET /resetpassword?email= - 发起密码重置并邮寄重置 token
pub async fn request_password_reset(
    State(state): State<AppState>,
    addr: Option<ConnectInfo<SocketAddr>>,
    Query(query): Query<ResetQuery>,
) -> Result<Json<Value>, ApiError> {
    let ip = client_ip(addr);
    if !state.reset_limiter.allow(&ip).await {
        return Err(ApiError::too_many_requests(
            "too many reset requests, try again later",
        ));
    }

    let email = query
        .email
        .filter(|e| !e.is_empty())
        .ok_or_else(|| ApiError::bad_request("email query parameter is required"))?;

    let reset = state.accounts.request_password_reset(&email).await?;
    state.mailer.send_password_reset(
        &reset.account.email,
        &reset.account.login,
        &reset.reset_token,
    );

    Ok(Json(json!({ "message": "password reset mail sent" })))
}

/// POST /resetconfirm - 用重置 token 设置新密码。
/// 路由是公开的，但 handler 要求重置用途的 Bearer token。
pub async fn confirm_password_reset(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ResetConfirmRequest>,
) -> Result<Json<AccountSummary>, ApiError> {
    let token = bearer_token(&headers).ok_or_else(ApiError::unauthorized)?;

    let account = state
        .accounts
        .confirm_password_reset(&token, &req.newpass, &req.newpass2)
        .await?;
    Ok(Json(account.into()))
}

/// GET /me - 当前会话对应的账户
pub async fn get_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthInfo>,
) -> Result<Json<AccountSummary>, ApiError> {
    let account = state.accounts.get_account(&auth.claims.sub).await?;
    Ok(Json(account.into()))
}
