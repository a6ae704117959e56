//! Delivery Marketplace Server - 多租户配送市场后端
//!
//! # 架构概述
//!
//! 核心是订单生命周期：下单 → 支付对账 → 抢单 → 配送状态机 → 争议。
//! 每一次状态变更都是对嵌入式数据库的一条条件更新（compare-and-swap），
//! 并发抢单、管理员取消与重复支付回调全部靠它串行化。
//!
//! # 模块结构
//!
//! ```text
//! delivery-server/src/
//! ├── core/          # 配置、状态、服务器
//! ├── auth/          # JWT 验证、身份提取器
//! ├── api/           # HTTP 路由和处理器
//! ├── db/            # 数据库层 (models + repositories)
//! ├── orders/        # 下单、抢单协议、配送状态机、争议
//! ├── payments/      # 支付网关 client 与对账
//! └── utils/         # 错误、日志、验证
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod orders;
pub mod payments;
pub mod utils;

// Re-export 公共类型
pub use auth::JwtService;
pub use core::{Config, Server, ServerState};
pub use orders::{CheckoutService, DeliveryFlow, DisputeFlow};
pub use payments::{PaymentGateway, PaymentReconciler};
pub use utils::{AppError, AppResult};

/// 设置运行环境 (dotenv + 日志)
pub fn setup_environment() {
    // .env 不存在不是错误
    let _ = dotenv::dotenv();

    let log_dir = std::env::var("LOG_DIR").ok();
    utils::logger::init_logger_with_file(
        std::env::var("LOG_LEVEL").ok().as_deref(),
        log_dir.as_deref(),
    );
}
