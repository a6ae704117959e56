//! Admin API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use shared::order::status::DisputeStatus;

use crate::auth::CurrentAdmin;
use crate::core::ServerState;
use crate::db::models::Order;
use crate::db::repository::AdminOrderFilter;
use crate::utils::{AppError, AppResponse, AppResult, ok};

/// Order listing query
#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
    #[serde(default)]
    pub filter: Option<String>,
}

/// List orders by tab filter (default: unpicked)
pub async fn list_orders(
    State(state): State<ServerState>,
    _admin: CurrentAdmin,
    Query(query): Query<ListOrdersQuery>,
) -> AppResult<Json<AppResponse<Vec<Order>>>> {
    let filter = AdminOrderFilter::parse(query.filter.as_deref().unwrap_or("unpicked"));
    let orders = state.order_repo().list_admin(filter).await?;
    Ok(ok(orders))
}

/// Assign-driver request body
#[derive(Debug, Deserialize)]
pub struct AssignDriverRequest {
    pub driver_id: String,
}

/// Assign an order to a driver (same atomic claim as the driver path)
pub async fn assign_driver(
    State(state): State<ServerState>,
    _admin: CurrentAdmin,
    Path(id): Path<String>,
    Json(payload): Json<AssignDriverRequest>,
) -> AppResult<Json<AppResponse<Order>>> {
    let order = state.delivery_flow().assign(&id, &payload.driver_id).await?;
    Ok(ok(order))
}

/// Cancel a non-terminal order
pub async fn cancel_order(
    State(state): State<ServerState>,
    _admin: CurrentAdmin,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Order>>> {
    let order = state.delivery_flow().cancel(&id).await?;
    Ok(ok(order))
}

/// Dispute listing query
#[derive(Debug, Deserialize)]
pub struct ListDisputesQuery {
    #[serde(default)]
    pub status: Option<String>,
}

/// List orders carrying a dispute, optionally filtered by dispute status
pub async fn list_disputes(
    State(state): State<ServerState>,
    _admin: CurrentAdmin,
    Query(query): Query<ListDisputesQuery>,
) -> AppResult<Json<AppResponse<Vec<Order>>>> {
    let status = match query.status.as_deref() {
        None | Some("All") | Some("") => None,
        Some(s) => Some(
            s.parse::<DisputeStatus>()
                .map_err(|e| AppError::validation(e))?,
        ),
    };
    let orders = state.dispute_flow().list(status).await?;
    Ok(ok(orders))
}

/// Dispute update request body
#[derive(Debug, Deserialize)]
pub struct UpdateDisputeRequest {
    pub status: DisputeStatus,
    #[serde(default)]
    pub notes_admin: String,
    #[serde(default)]
    pub refund_amount: Option<f64>,
}

/// Move a dispute to an admin-chosen status (ApprovedRefund populates the refund)
pub async fn update_dispute(
    State(state): State<ServerState>,
    _admin: CurrentAdmin,
    Path(id): Path<String>,
    Json(payload): Json<UpdateDisputeRequest>,
) -> AppResult<Json<AppResponse<Order>>> {
    let order = state
        .dispute_flow()
        .resolve(&id, payload.status, &payload.notes_admin, payload.refund_amount)
        .await?;
    Ok(ok(order))
}
