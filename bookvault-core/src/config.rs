//! 认证子系统配置：由调用方显式构造并传入，核心层不读环境变量

const DEFAULT_JWT_ISSUER: &str = "bookvault-api";
const DEFAULT_JWT_AUDIENCE: &str = "bookvault-clients";

/// bcrypt 默认代价因子
pub const DEFAULT_BCRYPT_COST: u32 = 10;

/// 认证配置
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// JWT 签名密钥
    pub jwt_secret: String,
    /// JWT issuer
    pub jwt_issuer: String,
    /// JWT audience
    pub jwt_audience: String,
    /// 会话 token 有效期（小时）
    pub session_ttl_hours: i64,
    /// 激活 token 有效期（小时）
    pub activation_ttl_hours: i64,
    /// 重置 token 有效期（小时）
    pub reset_ttl_hours: i64,
    /// bcrypt 代价因子
    pub bcrypt_cost: u32,
}

impl AuthConfig {
    /// 创建新的认证配置（密钥必填，其余为默认值）
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            jwt_issuer: DEFAULT_JWT_ISSUER.to_string(),
            jwt_audience: DEFAULT_JWT_AUDIENCE.to_string(),
            session_ttl_hours: 1,
            activation_ttl_hours: 24,
            reset_ttl_hours: 1,
            bcrypt_cost: DEFAULT_BCRYPT_COST,
        }
    }

    /// 配置 JWT iss/aud
    pub fn with_claims_context(
        mut self,
        issuer: impl Into<String>,
        audience: impl Into<String>,
    ) -> Self {
        self.jwt_issuer = issuer.into();
        self.jwt_audience = audience.into();
        self
    }

    /// 配置各类 token 有效期
    pub fn with_token_ttls(mut self, session: i64, activation: i64, reset: i64) -> Self {
        self.session_ttl_hours = session;
        self.activation_ttl_hours = activation;
        self.reset_ttl_hours = reset;
        self
    }

    /// 配置 bcrypt 代价因子
    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }
}
