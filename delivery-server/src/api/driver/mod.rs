//! Driver API Module
//!
//! 骑手端：可抢订单列表、我的订单、抢单、推进配送状态、通知。
//! 身份由 [`CurrentDriver`](crate::auth::CurrentDriver) 提取器保证。

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/driver", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/orders/available", get(handler::available))
        .route("/orders/my", get(handler::my_orders))
        .route("/orders/{id}/claim", post(handler::claim))
        .route("/orders/{id}/status", post(handler::update_status))
        .route("/notifications", get(handler::notifications))
}
