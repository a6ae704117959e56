//! Payment reconciliation
//!
//! Keeps `payment.status` consistent with the gateway's view of an invoice
//! while tolerating delayed, duplicate and out-of-order callbacks. All
//! mutations ride the `unpaid` compare-and-swap, so a repeated callback is a
//! no-op rather than a double-apply.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use shared::order::status::{PaymentMethod, PaymentStatus};

use crate::db::models::Order;
use crate::db::repository::OrderRepository;
use crate::payments::gateway::{
    CreateInvoice, LookupKey, PaymentGateway, normalize_invoice_status,
};
use crate::utils::{AppError, AppResult};

/// Result of `initiate`: what the client needs to hand off to the gateway
#[derive(Debug, Clone, Serialize)]
pub struct InitiatedPayment {
    pub order_id: String,
    pub invoice_id: String,
    pub payment_url: String,
}

/// Result of `reconcile`
#[derive(Debug)]
pub struct ReconcileOutcome {
    pub order: Order,
    /// The internal status the gateway's report mapped to
    pub status: PaymentStatus,
    /// false when the callback was a duplicate and nothing changed
    pub applied: bool,
}

/// Reconciliation settings taken from the server config
#[derive(Debug, Clone)]
pub struct ReconcilerSettings {
    pub currency: String,
    pub callback_base_url: String,
}

/// Payment reconciliation service
pub struct PaymentReconciler {
    orders: OrderRepository,
    gateway: Arc<dyn PaymentGateway>,
    settings: ReconcilerSettings,
}

impl PaymentReconciler {
    pub fn new(
        db: Surreal<Db>,
        gateway: Arc<dyn PaymentGateway>,
        settings: ReconcilerSettings,
    ) -> Self {
        Self {
            orders: OrderRepository::new(db),
            gateway,
            settings,
        }
    }

    /// Create a gateway invoice for an order
    ///
    /// The invoice value is the order's authoritative `totals.total`; a
    /// client-supplied amount is never consulted. The returned invoice id is
    /// persisted before this function returns, so after a crash the system
    /// still knows which external invoice maps to which order. A gateway
    /// failure leaves the order untouched and `initiate` re-attemptable.
    pub async fn initiate(&self, order_id: &str) -> AppResult<InitiatedPayment> {
        let record_id = OrderRepository::parse_order_id(order_id)?;
        let order = self.orders.get_by_id(&record_id).await?;

        if order.payment.method != PaymentMethod::Gateway {
            return Err(AppError::validation(
                "Order is cash on delivery, no gateway payment to initiate",
            ));
        }
        match order.payment.status {
            PaymentStatus::Unpaid => {}
            PaymentStatus::Paid => return Err(AppError::conflict("Order is already paid")),
            PaymentStatus::Failed => {
                return Err(AppError::conflict(
                    "Payment already failed, manual intervention required",
                ));
            }
        }

        let reference = record_id.to_string();
        let invoice = self
            .gateway
            .create_invoice(CreateInvoice {
                amount: order.totals.total,
                currency: self.settings.currency.clone(),
                customer_name: order.customer.name.clone(),
                customer_phone: order.customer.phone.clone(),
                callback_url: callback_url(&self.settings.callback_base_url, &reference),
                error_url: error_url(&self.settings.callback_base_url, &reference),
                reference: reference.clone(),
            })
            .await
            .map_err(|e| AppError::upstream(e.to_string()))?;

        self.orders
            .set_invoice_id(&record_id, &invoice.invoice_id, Utc::now())
            .await?;

        tracing::info!(
            order_id = %record_id,
            invoice_id = %invoice.invoice_id,
            amount = order.totals.total,
            "Payment initiated"
        );

        Ok(InitiatedPayment {
            order_id: reference,
            invoice_id: invoice.invoice_id,
            payment_url: invoice.payment_url,
        })
    }

    /// Reconcile an order against the gateway after a callback
    ///
    /// Verification is two-tier: the callback key is tried as a payment id
    /// first, then once more as an invoice id (some callback shapes put the
    /// invoice id in that slot). If both lookups fail the payment state is
    /// left unchanged and the caller gets `Upstream`; we never guess.
    pub async fn reconcile(&self, order_id: &str, payment_key: &str) -> AppResult<ReconcileOutcome> {
        let record_id = OrderRepository::parse_order_id(order_id)?;
        if payment_key.trim().is_empty() {
            return Err(AppError::validation("Missing payment id"));
        }

        let report = match self.gateway.payment_status(payment_key, LookupKey::PaymentId).await {
            Ok(report) => report,
            Err(first) => {
                tracing::warn!(
                    order_id = %record_id,
                    error = %first,
                    "Status lookup by payment id failed, retrying by invoice id"
                );
                self.gateway
                    .payment_status(payment_key, LookupKey::InvoiceId)
                    .await
                    .map_err(|second| {
                        AppError::upstream(format!(
                            "Payment verification failed by both keys: {first}; {second}"
                        ))
                    })?
            }
        };

        let status = normalize_invoice_status(&report.raw_status);
        tracing::info!(
            order_id = %record_id,
            invoice_id = %report.invoice_id,
            raw_status = %report.raw_status,
            status = status.as_str(),
            "Payment status verified"
        );

        match self
            .orders
            .apply_payment_status(&record_id, status, payment_key, &report.invoice_id, Utc::now())
            .await?
        {
            Some(order) => Ok(ReconcileOutcome {
                order,
                status,
                applied: true,
            }),
            None => {
                // 条件未命中：要么订单不存在，要么支付状态已是终态
                let order = self
                    .orders
                    .find_by_id(&record_id)
                    .await?
                    .ok_or_else(|| AppError::not_found(format!("Order {} not found", record_id)))?;

                if order.payment.status != status {
                    // 终态不回退：冲突的迟到回调只记日志
                    tracing::warn!(
                        order_id = %record_id,
                        current = order.payment.status.as_str(),
                        reported = status.as_str(),
                        "Conflicting payment callback ignored"
                    );
                }
                Ok(ReconcileOutcome {
                    order,
                    status,
                    applied: false,
                })
            }
        }
    }

    /// Gateway error-redirect path: fail the payment if still unpaid
    ///
    /// Duplicate or late error redirects no-op against the terminal status.
    pub async fn mark_failed(&self, order_id: &str) -> AppResult<Order> {
        let record_id = OrderRepository::parse_order_id(order_id)?;
        match self.orders.mark_payment_failed(&record_id, Utc::now()).await? {
            Some(order) => {
                tracing::info!(order_id = %record_id, "Payment marked failed via error redirect");
                Ok(order)
            }
            None => Ok(self.orders.get_by_id(&record_id).await?),
        }
    }
}

fn callback_url(base: &str, order_id: &str) -> String {
    format!("{}/api/payments/callback?order_id={}", base, percent_encode(order_id))
}

fn error_url(base: &str, order_id: &str) -> String {
    format!("{}/api/payments/error?order_id={}", base, percent_encode(order_id))
}

/// Order ids are `table:key`; only the colon needs escaping in practice,
/// but escape everything non-unreserved to be safe.
fn percent_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            other => out.push_str(&format!("%{:02X}", other)),
        }
    }
    out
}
