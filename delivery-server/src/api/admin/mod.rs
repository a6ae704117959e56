//! Admin API Module
//!
//! 管理端：订单列表/指派/取消，争议列表/处理。
//! 身份由 [`CurrentAdmin`](crate::auth::CurrentAdmin) 提取器保证
//! (admin 或 support 角色)。

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/admin", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/orders", get(handler::list_orders))
        .route("/orders/{id}/assign-driver", post(handler::assign_driver))
        .route("/orders/{id}/cancel", post(handler::cancel_order))
        .route("/disputes", get(handler::list_disputes))
        .route("/disputes/{id}/update", post(handler::update_dispute))
}
