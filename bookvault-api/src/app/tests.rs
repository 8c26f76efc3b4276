use super::{app_router, AppState, MailSettings, Mailer, RateLimiter};
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use bookvault_core::{AccountManager, AuthConfig, BookStore, RegisterRequest, TokenPurpose};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

fn test_mailer() -> Arc<Mailer> {
    // log-only mode; nothing leaves the process
    let settings = MailSettings {
        smtp_host: None,
        smtp_username: String::new(),
        smtp_password: String::new(),
        from: "Bookvault <no-reply@bookvault.local>".into(),
        public_url: "http://localhost:8080".into(),
    };
    Arc::new(Mailer::new(&settings).unwrap())
}

async fn test_state(dir: &TempDir) -> AppState {
    let config = AuthConfig::new("test-secret").with_bcrypt_cost(4);
    AppState {
        accounts: Arc::new(AccountManager::open(dir.path(), config).await.unwrap()),
        books: Arc::new(BookStore::open(dir.path()).await.unwrap()),
        mailer: test_mailer(),
        login_limiter: Arc::new(RateLimiter::new(100, Duration::from_secs(60))),
        reset_limiter: Arc::new(RateLimiter::new(100, Duration::from_secs(60))),
    }
}

fn register_request(login: &str) -> RegisterRequest {
    RegisterRequest {
        login: login.to_string(),
        password: "Secr3t!".to_string(),
        email: format!("{}@example.com", login),
        name: Some("Jan".to_string()),
        surname: None,
    }
}

/// 注册并激活一个账户，返回可用的会话 token
async fn seed_session(state: &AppState, login: &str) -> String {
    let registration = state
        .accounts
        .register(register_request(login))
        .await
        .unwrap();
    state
        .accounts
        .confirm_activation(&registration.activation_token)
        .await
        .unwrap();
    state
        .accounts
        .issue_token(&registration.account, TokenPurpose::Session)
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn bearer_request(method: &str, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

fn authed_json_request(method: &str, uri: &str, token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_ok_without_auth() {
    let dir = TempDir::new().unwrap();
    let app = app_router(test_state(&dir).await, Vec::new());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn register_returns_created_summary() {
    let dir = TempDir::new().unwrap();
    let app = app_router(test_state(&dir).await, Vec::new());

    let body = json!({
        "login": "alice",
        "password": "Secr3t!",
        "email": "alice@example.com",
        "name": "Jan"
    });
    let response = app
        .clone()
        .oneshot(json_request("POST", "/register", body.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let summary = body_json(response).await;
    assert_eq!(summary["login"], "alice");
    assert_eq!(summary["activated"], false);
    // 响应里绝不能出现密码或哈希
    assert!(summary.get("password").is_none());
    assert!(summary.get("password_hash").is_none());

    // 同一登录名再注册一次
    let response = app
        .oneshot(json_request("POST", "/register", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn register_rejects_missing_fields() {
    let dir = TempDir::new().unwrap();
    let app = app_router(test_state(&dir).await, Vec::new());

    let body = json!({ "login": "", "password": "Secr3t!", "email": "a@example.com" });
    let response = app
        .oneshot(json_request("POST", "/register", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn activation_and_login_flow() {
    let dir = TempDir::new().unwrap();
    let state = test_state(&dir).await;
    let app = app_router(state.clone(), Vec::new());

    let registration = state
        .accounts
        .register(register_request("alice"))
        .await
        .unwrap();

    // 激活
    let uri = format!("/registerconfirm?token={}", registration.activation_token);
    let response = app
        .clone()
        .oneshot(Request::builder().uri(&uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let summary = body_json(response).await;
    assert_eq!(summary["activated"], true);

    // 登录拿会话 token
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/login",
            json!({ "login": "alice", "password": "Secr3t!" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let session = body_json(response).await;
    assert_eq!(session["token_type"], "Bearer");
    let token = session["token"].as_str().unwrap().to_string();

    // 会话 token 可以访问受保护接口
    let response = app
        .clone()
        .oneshot(bearer_request("GET", "/books", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(bearer_request("GET", "/me", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let me = body_json(response).await;
    assert_eq!(me["login"], "alice");
}

#[tokio::test]
async fn registerconfirm_requires_token_param() {
    let dir = TempDir::new().unwrap();
    let app = app_router(test_state(&dir).await, Vec::new());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/registerconfirm")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn registerconfirm_rejects_session_token() {
    let dir = TempDir::new().unwrap();
    let state = test_state(&dir).await;
    let app = app_router(state.clone(), Vec::new());

    let session = seed_session(&state, "alice").await;
    let uri = format!("/registerconfirm?token={}", session);
    let response = app
        .oneshot(Request::builder().uri(&uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn login_failures_are_uniform() {
    let dir = TempDir::new().unwrap();
    let state = test_state(&dir).await;
    let app = app_router(state.clone(), Vec::new());
    seed_session(&state, "alice").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/login",
            json!({ "login": "alice", "password": "wrong" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let wrong_password = body_json(response).await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/login",
            json!({ "login": "nobody", "password": "Secr3t!" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let unknown_login = body_json(response).await;

    // 未知登录名和密码错误的响应体完全一致
    assert_eq!(wrong_password, unknown_login);
    assert_eq!(wrong_password["code"], "InvalidCredentials");
}

#[tokio::test]
async fn login_is_rate_limited() {
    let dir = TempDir::new().unwrap();
    let mut state = test_state(&dir).await;
    state.login_limiter = Arc::new(RateLimiter::new(2, Duration::from_secs(60)));
    let app = app_router(state, Vec::new());

    let body = json!({ "login": "alice", "password": "wrong" });
    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(json_request("POST", "/login", body.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
    let response = app
        .oneshot(json_request("POST", "/login", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn books_require_session_token() {
    let dir = TempDir::new().unwrap();
    let state = test_state(&dir).await;
    let app = app_router(state.clone(), Vec::new());

    // 无 Authorization header
    let response = app
        .clone()
        .oneshot(Request::builder().uri("/books").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // 伪造的 token
    let response = app
        .clone()
        .oneshot(bearer_request("GET", "/books", "not-a-jwt"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // 激活 token 不能当会话 token 用
    let registration = state
        .accounts
        .register(register_request("alice"))
        .await
        .unwrap();
    let response = app
        .oneshot(bearer_request(
            "GET",
            "/books",
            &registration.activation_token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn books_crud_roundtrip() {
    let dir = TempDir::new().unwrap();
    let state = test_state(&dir).await;
    let app = app_router(state.clone(), Vec::new());
    let token = seed_session(&state, "alice").await;

    // 创建
    let response = app
        .clone()
        .oneshot(authed_json_request(
            "POST",
            "/books",
            &token,
            json!({ "title": "Solaris", "author": "Stanisław Lem", "year": 1961 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let book = body_json(response).await;
    let id = book["id"].as_str().unwrap().to_string();

    // 列表
    let response = app
        .clone()
        .oneshot(bearer_request("GET", "/books", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let list = body_json(response).await;
    assert_eq!(list.as_array().unwrap().len(), 1);

    // 更新
    let uri = format!("/books/{}", id);
    let response = app
        .clone()
        .oneshot(authed_json_request(
            "PUT",
            &uri,
            &token,
            json!({ "title": "Solaris (wyd. II)" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await;
    assert_eq!(updated["title"], "Solaris (wyd. II)");
    assert_eq!(updated["author"], "Stanisław Lem");

    // 删除
    let response = app
        .clone()
        .oneshot(bearer_request("DELETE", &uri, &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(bearer_request("GET", &uri, &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn password_reset_flow_over_http() {
    let dir = TempDir::new().unwrap();
    let state = test_state(&dir).await;
    let app = app_router(state.clone(), Vec::new());
    seed_session(&state, "alice").await;

    // 发起重置
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/resetpassword?email=alice@example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // token 会寄到邮箱；重置 token 是无状态的，测试里直接再签发一个等价的
    let reset = state
        .accounts
        .request_password_reset("alice@example.com")
        .await
        .unwrap();

    // 新密码不一致
    let response = app
        .clone()
        .oneshot(authed_json_request(
            "POST",
            "/resetconfirm",
            &reset.reset_token,
            json!({ "newpass": "N3wpass!", "newpass2": "different" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let mismatch = body_json(response).await;
    assert_eq!(mismatch["code"], "PasswordMismatch");

    // 正确确认
    let response = app
        .clone()
        .oneshot(authed_json_request(
            "POST",
            "/resetconfirm",
            &reset.reset_token,
            json!({ "newpass": "N3wpass!", "newpass2": "N3wpass!" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // 旧密码失效，新密码可登录
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/login",
            json!({ "login": "alice", "password": "Secr3t!" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(json_request(
            "POST",
            "/login",
            json!({ "login": "alice", "password": "N3wpass!" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn resetconfirm_requires_bearer_token() {
    let dir = TempDir::new().unwrap();
    let app = app_router(test_state(&dir).await, Vec::new());

    let response = app
        .oneshot(json_request(
            "POST",
            "/resetconfirm",
            json!({ "newpass": "N3wpass!", "newpass2": "N3wpass!" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn resetconfirm_rejects_session_token() {
    let dir = TempDir::new().unwrap();
    let state = test_state(&dir).await;
    let app = app_router(state.clone(), Vec::new());
    let session = seed_session(&state, "alice").await;

    let response = app
        .oneshot(authed_json_request(
            "POST",
            "/resetconfirm",
            &session,
            json!({ "newpass": "N3wpass!", "newpass2": "N3wpass!" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn resetpassword_unknown_email_is_not_found() {
    let dir = TempDir::new().unwrap();
    let app = app_router(test_state(&dir).await, Vec::new());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/resetpassword?email=nobody@example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_path_returns_404_for_session() {
    let dir = TempDir::new().unwrap();
    let state = test_state(&dir).await;
    let app = app_router(state.clone(), Vec::new());
    let token = seed_session(&state, "alice").await;

    let response = app
        .oneshot(bearer_request("GET", "/nope", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["code"], "NotFound");
}
