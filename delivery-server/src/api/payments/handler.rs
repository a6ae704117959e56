//! Payments API Handlers

use axum::{
    Json,
    extract::{Query, State},
    response::Redirect,
};
use serde::Deserialize;

use shared::order::status::PaymentStatus;

use crate::core::ServerState;
use crate::payments::InitiatedPayment;
use crate::utils::{AppError, AppResponse, AppResult, ok};

/// Initiate request: only the order id, the amount is never client-supplied
#[derive(Debug, Deserialize)]
pub struct InitiateRequest {
    pub order_id: String,
}

/// Create a gateway invoice for an order and return the hosted payment URL
pub async fn initiate(
    State(state): State<ServerState>,
    Json(payload): Json<InitiateRequest>,
) -> AppResult<Json<AppResponse<InitiatedPayment>>> {
    let initiated = state.reconciler().initiate(&payload.order_id).await?;
    Ok(ok(initiated))
}

/// Callback query. The gateway is inconsistent about the key name, so the
/// adapter normalizes every observed spelling here, once.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    #[serde(alias = "orderId")]
    pub order_id: String,
    #[serde(default, alias = "paymentId", alias = "PaymentId", alias = "Id")]
    pub payment_id: Option<String>,
}

/// Gateway success/completion callback
///
/// Verifies the payment against the gateway (never trusts the redirect
/// alone), applies the idempotent status update, then deep-links back into
/// the app.
pub async fn callback(
    State(state): State<ServerState>,
    Query(query): Query<CallbackQuery>,
) -> AppResult<Redirect> {
    let payment_id = query
        .payment_id
        .ok_or_else(|| AppError::validation("Missing payment id"))?;

    let outcome = state.reconciler().reconcile(&query.order_id, &payment_id).await?;

    let scheme = &state.config.app_scheme;
    let target = if outcome.order.payment.status == PaymentStatus::Paid {
        format!("{scheme}://payment-success?order_id={}", query.order_id)
    } else {
        format!("{scheme}://payment-failed?order_id={}", query.order_id)
    };
    Ok(Redirect::temporary(&target))
}

/// Error redirect query
#[derive(Debug, Deserialize)]
pub struct ErrorQuery {
    #[serde(default, alias = "orderId")]
    pub order_id: Option<String>,
}

/// Gateway error/cancel redirect: fail the payment if still unpaid
pub async fn payment_error(
    State(state): State<ServerState>,
    Query(query): Query<ErrorQuery>,
) -> AppResult<Redirect> {
    if let Some(ref order_id) = query.order_id {
        state.reconciler().mark_failed(order_id).await?;
    }

    let scheme = &state.config.app_scheme;
    let order_id = query.order_id.unwrap_or_default();
    Ok(Redirect::temporary(&format!(
        "{scheme}://payment-failed?order_id={order_id}"
    )))
}
