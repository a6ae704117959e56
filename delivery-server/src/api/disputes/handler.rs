//! Customer Disputes API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;

use crate::auth::CustomerPhone;
use crate::core::ServerState;
use crate::db::models::DisputeInfo;
use crate::utils::{AppResponse, AppResult, ok};

/// Open-dispute request body
#[derive(Debug, Deserialize)]
pub struct OpenDisputeRequest {
    pub reason: String,
    #[serde(default)]
    pub notes_customer: String,
}

/// Open a dispute on a delivered order inside the dispute window
pub async fn open(
    State(state): State<ServerState>,
    CustomerPhone(phone): CustomerPhone,
    Path(order_id): Path<String>,
    Json(payload): Json<OpenDisputeRequest>,
) -> AppResult<Json<AppResponse<DisputeInfo>>> {
    let dispute = state
        .dispute_flow()
        .open(&order_id, &phone, &payload.reason, &payload.notes_customer)
        .await?;
    Ok(ok(dispute))
}

/// Read the dispute on the caller's own order
pub async fn get(
    State(state): State<ServerState>,
    CustomerPhone(phone): CustomerPhone,
    Path(order_id): Path<String>,
) -> AppResult<Json<AppResponse<DisputeInfo>>> {
    let dispute = state.dispute_flow().get(&order_id, &phone).await?;
    Ok(ok(dispute))
}
