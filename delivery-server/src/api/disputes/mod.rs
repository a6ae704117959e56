//! Customer Disputes API Module
//!
//! 客户开争议/查争议。所有权由 x-customer-phone 与订单电话比对保证。

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/customer/disputes", routes())
}

fn routes() -> Router<ServerState> {
    Router::new().route("/{order_id}", post(handler::open).get(handler::get))
}
