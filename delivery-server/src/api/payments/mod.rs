//! Payments API Module
//!
//! 发起支付 + 网关回调/失败跳转。callback 与 error 由网关浏览器跳转
//! 触发，可能到达 0 次、1 次或多次，顺序不定——对账逻辑保证幂等。

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/payments", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/initiate", post(handler::initiate))
        .route("/callback", get(handler::callback))
        .route("/error", get(handler::payment_error))
}
