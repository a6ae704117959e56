//! Dispute / refund workflow
//!
//! Time-boxed post-delivery disputes. Opening requires ownership (customer
//! phone), a Delivered order, no existing dispute, and a delivery younger
//! than the configured window. Resolution is admin-driven.

use chrono::{Duration, Utc};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use shared::order::status::{DeliveryStatus, DisputeStatus};

use crate::db::models::{DisputeInfo, Order, RefundInfo};
use crate::db::repository::OrderRepository;
use crate::utils::validation::{MAX_NOTE_LEN, validate_amount, validate_required_text};
use crate::utils::{AppError, AppResult};

/// Dispute workflow service
pub struct DisputeFlow {
    orders: OrderRepository,
    /// Hours after delivery during which a dispute may be opened.
    /// `<= 0` disables disputes entirely (a valid operating mode).
    window_hours: i64,
    /// Refund currency
    currency: String,
}

impl DisputeFlow {
    pub fn new(db: Surreal<Db>, window_hours: i64, currency: impl Into<String>) -> Self {
        Self {
            orders: OrderRepository::new(db),
            window_hours,
            currency: currency.into(),
        }
    }

    /// Customer opens a dispute on their delivered order
    pub async fn open(
        &self,
        order_id: &str,
        customer_phone: &str,
        reason: &str,
        notes_customer: &str,
    ) -> AppResult<DisputeInfo> {
        validate_required_text(reason, "reason", MAX_NOTE_LEN)?;
        if notes_customer.len() > MAX_NOTE_LEN {
            return Err(AppError::validation("notes are too long"));
        }

        let order_id = OrderRepository::parse_order_id(order_id)?;
        let order = self.orders.get_by_id(&order_id).await?;

        if order.customer.phone != customer_phone {
            return Err(AppError::forbidden("Order does not belong to this customer"));
        }
        if self.window_hours <= 0 {
            return Err(AppError::forbidden("Disputes are disabled"));
        }
        if order.delivery.status != DeliveryStatus::Delivered {
            return Err(AppError::conflict("Order is not delivered"));
        }
        if order.dispute.status != DisputeStatus::None {
            return Err(AppError::conflict("Dispute already exists for this order"));
        }
        let Some(delivered_at) = order.delivery.delivered_at else {
            return Err(AppError::conflict("Delivery time missing, cannot open dispute"));
        };

        let now = Utc::now();
        if now - delivered_at > Duration::hours(self.window_hours) {
            return Err(AppError::forbidden(format!(
                "Dispute window expired. Allowed within {} hours after delivery",
                self.window_hours
            )));
        }

        let dispute = DisputeInfo {
            status: DisputeStatus::Open,
            reason: reason.to_string(),
            notes_customer: notes_customer.to_string(),
            notes_admin: String::new(),
            created_at: Some(now),
            updated_at: Some(now),
            refund: RefundInfo {
                amount: 0.0,
                currency: self.currency.clone(),
                method: String::new(),
                refund_id: String::new(),
                refunded_at: None,
            },
        };

        // 前面的读取只用于报错归类；真正的防重在这条条件更新里
        match self.orders.open_dispute(&order_id, dispute, now).await? {
            Some(order) => {
                tracing::info!(order_id = %order_id, "Dispute opened");
                Ok(order.dispute)
            }
            None => Err(AppError::conflict("Dispute already exists for this order")),
        }
    }

    /// Customer reads the dispute on their own order
    pub async fn get(&self, order_id: &str, customer_phone: &str) -> AppResult<DisputeInfo> {
        let order_id = OrderRepository::parse_order_id(order_id)?;
        let order = self.orders.get_by_id(&order_id).await?;
        if order.customer.phone != customer_phone {
            return Err(AppError::forbidden("Order does not belong to this customer"));
        }
        Ok(order.dispute)
    }

    /// Admin moves an existing dispute to a new status
    ///
    /// `ApprovedRefund` populates the refund sub-object. The refund amount is
    /// not checked against the order total (admins are trusted) but it must
    /// be a finite, non-negative number.
    pub async fn resolve(
        &self,
        order_id: &str,
        new_status: DisputeStatus,
        notes_admin: &str,
        refund_amount: Option<f64>,
    ) -> AppResult<Order> {
        if !new_status.is_resolution() {
            return Err(AppError::validation(format!(
                "Invalid dispute status: {}",
                new_status.as_str()
            )));
        }
        if notes_admin.len() > MAX_NOTE_LEN {
            return Err(AppError::validation("notes are too long"));
        }

        let order_id = OrderRepository::parse_order_id(order_id)?;
        let now = Utc::now();

        let refund = if new_status == DisputeStatus::ApprovedRefund {
            let amount = refund_amount.unwrap_or(0.0);
            validate_amount(amount, "refund_amount")?;
            Some(RefundInfo {
                amount,
                currency: self.currency.clone(),
                // Manual payouts for now; gateway refunds are a later upgrade
                method: "manual".to_string(),
                refund_id: String::new(),
                refunded_at: Some(now),
            })
        } else {
            None
        };

        match self
            .orders
            .resolve_dispute(&order_id, new_status, notes_admin, refund, now)
            .await?
        {
            Some(order) => {
                tracing::info!(
                    order_id = %order_id,
                    status = new_status.as_str(),
                    "Dispute resolved"
                );
                Ok(order)
            }
            None => match self.orders.find_by_id(&order_id).await? {
                None => Err(AppError::not_found(format!("Order {} not found", order_id))),
                Some(_) => Err(AppError::conflict("No dispute exists for this order")),
            },
        }
    }

    /// Admin dispute listing, optionally filtered by status
    pub async fn list(&self, status: Option<DisputeStatus>) -> AppResult<Vec<Order>> {
        Ok(self.orders.list_disputes(status).await?)
    }
}
