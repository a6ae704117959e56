//! Driver API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;

use shared::order::status::DeliveryStatus;

use crate::auth::CurrentDriver;
use crate::core::ServerState;
use crate::db::models::{Notification, Order};
use crate::utils::{AppResponse, AppResult, ok};

/// Orders open for claiming, newest first
pub async fn available(
    State(state): State<ServerState>,
    _driver: CurrentDriver,
) -> AppResult<Json<AppResponse<Vec<Order>>>> {
    let orders = state.delivery_flow().list_available().await?;
    Ok(ok(orders))
}

/// Orders assigned to this driver (current and delivered), newest first
pub async fn my_orders(
    State(state): State<ServerState>,
    driver: CurrentDriver,
) -> AppResult<Json<AppResponse<Vec<Order>>>> {
    let orders = state.delivery_flow().list_for_driver(&driver.id).await?;
    Ok(ok(orders))
}

/// Claim an unassigned order (atomic; losers get 409)
pub async fn claim(
    State(state): State<ServerState>,
    driver: CurrentDriver,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Order>>> {
    let order = state.delivery_flow().claim(&id, &driver.id).await?;
    Ok(ok(order))
}

/// Status update request
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub new_status: DeliveryStatus,
}

/// Advance an assigned order (Claimed → PickedUp → Delivered)
pub async fn update_status(
    State(state): State<ServerState>,
    driver: CurrentDriver,
    Path(id): Path<String>,
    Json(payload): Json<UpdateStatusRequest>,
) -> AppResult<Json<AppResponse<Order>>> {
    let order = state
        .delivery_flow()
        .advance(&id, &driver.id, payload.new_status)
        .await?;
    Ok(ok(order))
}

/// The driver's notification projections, newest first
pub async fn notifications(
    State(state): State<ServerState>,
    driver: CurrentDriver,
) -> AppResult<Json<AppResponse<Vec<Notification>>>> {
    let rows = state.notification_repo().list_for_driver(&driver.id).await?;
    Ok(ok(rows))
}
