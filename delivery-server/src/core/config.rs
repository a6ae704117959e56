//! 服务器配置 - 订单核心的所有配置项

/// 服务器配置
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | /var/lib/delivery | 工作目录 |
/// | HTTP_PORT | 4000 | HTTP 服务端口 |
/// | DELIVERY_FEE | 10.0 | 固定配送费 (服务端常量，客户端不可覆盖) |
/// | CURRENCY | QAR | 货币代码 |
/// | DISPUTE_WINDOW_HOURS | 24 | 配送后可开争议的时间窗口 (<=0 时禁用争议) |
/// | GATEWAY_BASE_URL | https://apitest.gateway.example | 支付网关地址 |
/// | GATEWAY_API_TOKEN | (空) | 支付网关令牌 |
/// | GATEWAY_TIMEOUT_MS | 15000 | 网关请求超时(毫秒) |
/// | APP_BASE_URL | http://localhost:4000 | 回调 URL 的公网基址 |
/// | APP_SCHEME | flamingdelivery | 移动端深链 scheme |
/// | JWT_SECRET | (开发默认值) | JWT 签名密钥 |
/// | ENVIRONMENT | development | 运行环境 |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/delivery HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库、日志等文件
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 运行环境: development | staging | production
    pub environment: String,

    // === 订单核心配置 ===
    /// 固定配送费 — 只信任服务端的这个值
    pub delivery_fee: f64,
    /// 货币代码 (订单金额与退款共用)
    pub currency: String,
    /// 争议窗口 (小时)。<= 0 表示禁用争议，属合法运行模式
    pub dispute_window_hours: i64,

    // === 支付网关配置 ===
    /// 网关基址
    pub gateway_base_url: String,
    /// 网关 API 令牌
    pub gateway_api_token: String,
    /// 网关请求超时 (毫秒)
    pub gateway_timeout_ms: u64,
    /// 回调 URL 的公网基址
    pub app_base_url: String,
    /// 移动端深链 scheme (支付完成后跳回 App)
    pub app_scheme: String,

    // === 认证 ===
    /// JWT 签名密钥
    pub jwt_secret: String,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/delivery".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(4000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),

            delivery_fee: std::env::var("DELIVERY_FEE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10.0),
            currency: std::env::var("CURRENCY").unwrap_or_else(|_| "QAR".into()),
            dispute_window_hours: std::env::var("DISPUTE_WINDOW_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(24),

            gateway_base_url: std::env::var("GATEWAY_BASE_URL")
                .unwrap_or_else(|_| "https://apitest.gateway.example".into()),
            gateway_api_token: std::env::var("GATEWAY_API_TOKEN").unwrap_or_default(),
            gateway_timeout_ms: std::env::var("GATEWAY_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(15_000),
            app_base_url: std::env::var("APP_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:4000".into()),
            app_scheme: std::env::var("APP_SCHEME").unwrap_or_else(|_| "flamingdelivery".into()),

            jwt_secret: std::env::var("JWT_SECRET")
                .unwrap_or_else(|_| "dev-only-secret-replace-in-production".into()),
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(delivery_fee: f64, dispute_window_hours: i64) -> Self {
        let mut config = Self::from_env();
        config.delivery_fee = delivery_fee;
        config.dispute_window_hours = dispute_window_hours;
        config
    }

    /// 数据库目录 (work_dir/database)
    pub fn database_dir(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.work_dir).join("database")
    }

    /// 日志目录 (work_dir/logs)
    pub fn log_dir(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.work_dir).join("logs")
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
