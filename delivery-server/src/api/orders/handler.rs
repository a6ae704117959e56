//! Order API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;

use shared::order::types::CheckoutRequest;

use crate::core::ServerState;
use crate::db::models::Order;
use crate::db::repository::OrderRepository;
use crate::utils::{AppResponse, AppResult, ok};

/// Checkout response: the order id plus the computed totals
#[derive(Debug, Serialize)]
pub struct OrderCreated {
    pub order_id: String,
    pub total: f64,
}

/// Create an order from an explicit cart payload
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<CheckoutRequest>,
) -> AppResult<Json<AppResponse<OrderCreated>>> {
    let order = state.checkout_service().place_order(payload).await?;
    Ok(ok(OrderCreated {
        order_id: order.id_string(),
        total: order.totals.total,
    }))
}

/// Get order by id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Order>>> {
    let record_id = OrderRepository::parse_order_id(&id)?;
    let order = state.order_repo().get_by_id(&record_id).await?;
    Ok(ok(order))
}
