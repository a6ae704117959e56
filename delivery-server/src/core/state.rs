//! 服务器状态

use std::sync::Arc;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::auth::JwtService;
use crate::core::Config;
use crate::db::DbService;
use crate::db::repository::{NotificationRepository, OrderRepository};
use crate::orders::{CheckoutService, DeliveryFlow, DisputeFlow};
use crate::payments::gateway::HttpPaymentGateway;
use crate::payments::{PaymentGateway, PaymentReconciler, ReconcilerSettings};

/// 服务器状态 - 持有所有服务的单例引用
///
/// 使用 Arc 实现浅拷贝，所有权成本极低。
///
/// # 服务组件
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | db | Surreal<Db> | 嵌入式数据库 |
/// | gateway | Arc<dyn PaymentGateway> | 支付网关 collaborator |
/// | jwt_service | Arc<JwtService> | JWT 验证服务 |
#[derive(Clone)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// 嵌入式数据库 (SurrealDB)
    pub db: Surreal<Db>,
    /// 支付网关
    pub gateway: Arc<dyn PaymentGateway>,
    /// JWT 验证服务
    pub jwt_service: Arc<JwtService>,
}

impl ServerState {
    /// 创建服务器状态 (手动构造)
    ///
    /// 通常使用 [`ServerState::initialize`] 代替
    pub fn new(
        config: Config,
        db: Surreal<Db>,
        gateway: Arc<dyn PaymentGateway>,
        jwt_service: Arc<JwtService>,
    ) -> Self {
        Self {
            config,
            db,
            gateway,
            jwt_service,
        }
    }

    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 数据库 (work_dir/database/delivery.db)
    /// 2. 支付网关 HTTP 客户端 (带超时)
    /// 3. JWT 服务
    ///
    /// # Panics
    ///
    /// 数据库或网关客户端初始化失败时 panic
    pub async fn initialize(config: &Config) -> Self {
        let db_service = DbService::new(&config.database_dir())
            .await
            .expect("Failed to initialize database");

        let gateway = HttpPaymentGateway::new(
            config.gateway_base_url.clone(),
            config.gateway_api_token.clone(),
            config.currency.clone(),
            config.gateway_timeout_ms,
        )
        .expect("Failed to initialize payment gateway client");

        Self::new(
            config.clone(),
            db_service.db,
            Arc::new(gateway),
            Arc::new(JwtService::new(&config.jwt_secret)),
        )
    }

    /// 内存态 (测试用): 内存数据库 + 注入的网关实现
    pub async fn in_memory(config: Config, gateway: Arc<dyn PaymentGateway>) -> Self {
        let db_service = DbService::memory()
            .await
            .expect("Failed to initialize in-memory database");
        let jwt = Arc::new(JwtService::new(&config.jwt_secret));
        Self::new(config, db_service.db, gateway, jwt)
    }

    // ========== Service constructors ==========
    //
    // Repositories and workflow services are cheap to build; handlers create
    // them per request from the shared db handle.

    /// 订单仓库
    pub fn order_repo(&self) -> OrderRepository {
        OrderRepository::new(self.db.clone())
    }

    /// 通知投影仓库
    pub fn notification_repo(&self) -> NotificationRepository {
        NotificationRepository::new(self.db.clone())
    }

    /// 下单服务
    pub fn checkout_service(&self) -> CheckoutService {
        CheckoutService::new(self.db.clone(), self.config.delivery_fee)
    }

    /// 抢单/配送状态机服务
    pub fn delivery_flow(&self) -> DeliveryFlow {
        DeliveryFlow::new(self.db.clone())
    }

    /// 争议流程服务
    pub fn dispute_flow(&self) -> DisputeFlow {
        DisputeFlow::new(
            self.db.clone(),
            self.config.dispute_window_hours,
            self.config.currency.clone(),
        )
    }

    /// 支付对账服务
    pub fn reconciler(&self) -> PaymentReconciler {
        PaymentReconciler::new(
            self.db.clone(),
            self.gateway.clone(),
            ReconcilerSettings {
                currency: self.config.currency.clone(),
                callback_base_url: self.config.app_base_url.clone(),
            },
        )
    }
}
