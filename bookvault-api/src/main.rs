mod app;

use anyhow::Context;
use app::{app_router, AppState, MailSettings, Mailer, RateLimiter};
use bookvault_core::{AccountManager, AuthConfig, BookStore, DEFAULT_BCRYPT_COST};
use dotenvy::dotenv;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone)]
struct ApiConfig {
    bind: SocketAddr,
    data_dir: PathBuf,
    /// JWT 签名密钥（必填）
    jwt_secret: String,
    /// JWT iss
    jwt_issuer: String,
    /// JWT aud
    jwt_audience: String,
    /// 会话 token 有效期（小时）
    session_ttl_hours: i64,
    /// 激活 token 有效期（小时）
    activation_ttl_hours: i64,
    /// 重置 token 有效期（小时）
    reset_ttl_hours: i64,
    /// bcrypt 代价因子
    bcrypt_cost: u32,
    /// CORS 允许的来源列表（空则允许所有）
    cors_origins: Vec<String>,
    /// 对外可访问的服务地址（邮件里的确认链接用）
    public_url: String,
    /// SMTP 主机；未配置时邮件只写入日志
    smtp_host: Option<String>,
    smtp_username: String,
    smtp_password: String,
    /// 发件人地址
    mail_from: String,
}

impl ApiConfig {
    fn from_env() -> anyhow::Result<Self> {
        let bind = env::var("BV_BIND")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(|| "0.0.0.0:8080".parse().expect("valid default bind"));

        let data_dir = env::var("BV_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data"));

        // JWT 密钥没有默认值：没有它签发的 token 无法在重启后验证
        let jwt_secret = env::var("BV_JWT_SECRET")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .context("BV_JWT_SECRET must be set to a non-empty secret")?;

        let jwt_issuer = env::var("BV_JWT_ISSUER").unwrap_or_else(|_| "bookvault-api".into());
        let jwt_audience =
            env::var("BV_JWT_AUDIENCE").unwrap_or_else(|_| "bookvault-clients".into());

        let session_ttl_hours = env::var("BV_SESSION_TOKEN_HOURS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(1);
        let activation_ttl_hours = env::var("BV_ACTIVATION_TOKEN_HOURS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(24);
        let reset_ttl_hours = env::var("BV_RESET_TOKEN_HOURS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(1);

        let bcrypt_cost = env::var("BV_BCRYPT_COST")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_BCRYPT_COST);

        // CORS 允许的来源，逗号分隔；空或 "*" 表示允许所有
        let cors_origins = env::var("BV_CORS_ORIGINS")
            .ok()
            .map(|s| {
                let trimmed = s.trim();
                if trimmed.is_empty() || trimmed == "*" {
                    vec![]
                } else {
                    trimmed
                        .split(',')
                        .filter(|t| !t.trim().is_empty())
                        .map(|t| t.trim().to_string())
                        .collect()
                }
            })
            .unwrap_or_default();

        let public_url =
            env::var("BV_PUBLIC_URL").unwrap_or_else(|_| "http://localhost:8080".into());

        let smtp_host = env::var("BV_SMTP_HOST")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let smtp_username = env::var("BV_SMTP_USERNAME").unwrap_or_default();
        let smtp_password = env::var("BV_SMTP_PASSWORD").unwrap_or_default();
        let mail_from = env::var("BV_MAIL_FROM")
            .unwrap_or_else(|_| "Bookvault <no-reply@bookvault.local>".into());

        Ok(Self {
            bind,
            data_dir,
            jwt_secret,
            jwt_issuer,
            jwt_audience,
            session_ttl_hours,
            activation_ttl_hours,
            reset_ttl_hours,
            bcrypt_cost,
            cors_origins,
            public_url,
            smtp_host,
            smtp_username,
            smtp_password,
            mail_from,
        })
    }

    fn auth_config(&self) -> AuthConfig {
        AuthConfig::new(self.jwt_secret.clone())
            .with_claims_context(self.jwt_issuer.clone(), self.jwt_audience.clone())
            .with_token_ttls(
                self.session_ttl_hours,
                self.activation_ttl_hours,
                self.reset_ttl_hours,
            )
            .with_bcrypt_cost(self.bcrypt_cost)
    }

    fn mail_settings(&self) -> MailSettings {
        MailSettings {
            smtp_host: self.smtp_host.clone(),
            smtp_username: self.smtp_username.clone(),
            smtp_password: self.smtp_password.clone(),
            from: self.mail_from.clone(),
            public_url: self.public_url.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 优先读取 .env（若存在）
    let _ = dotenv();
    init_tracing();

    let config = ApiConfig::from_env()?;
    info!("starting API on {}", config.bind);

    let accounts = Arc::new(AccountManager::open(&config.data_dir, config.auth_config()).await?);
    let books = Arc::new(BookStore::open(&config.data_dir).await?);
    let mailer = Arc::new(Mailer::new(&config.mail_settings())?);

    let login_limiter = Arc::new(RateLimiter::new(10, Duration::from_secs(60)));
    let reset_limiter = Arc::new(RateLimiter::new(5, Duration::from_secs(300)));

    let state = AppState {
        accounts,
        books,
        mailer,
        login_limiter,
        reset_limiter,
    };

    let app = app_router(state, config.cors_origins.clone());
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

fn init_tracing() {
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);
    let filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}
