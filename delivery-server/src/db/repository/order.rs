//! Order Repository
//!
//! 订单聚合的唯一写入口。读取是普通查询；所有状态变更都是带前置条件的
//! 单条 UPDATE 语句（compare-and-swap）：条件不再成立时语句不命中，
//! 返回 `None`，由调用方归类为 Conflict / NotFound / Forbidden。

use chrono::{DateTime, Utc};
use surrealdb::{RecordId, Surreal};
use surrealdb::engine::local::Db;

use shared::order::status::{DeliveryStatus, DisputeStatus, PaymentStatus};

use crate::db::models::{DisputeInfo, Order, RefundInfo};
use crate::orders::money;

use super::{BaseRepository, RepoError, RepoResult, parse_id};

pub const TABLE: &str = "order";

/// Admin listing filters (mirrors the admin orders page tabs)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdminOrderFilter {
    /// Pending and unassigned, the default tab
    #[default]
    Unpicked,
    Claimed,
    PickedUp,
    Delivered,
    Cancelled,
}

impl AdminOrderFilter {
    /// Parse a query-string filter; unrecognized values fall back to Unpicked
    pub fn parse(key: &str) -> Self {
        match key.trim() {
            "Claimed" => AdminOrderFilter::Claimed,
            "PickedUp" => AdminOrderFilter::PickedUp,
            "Delivered" => AdminOrderFilter::Delivered,
            "Cancelled" => AdminOrderFilter::Cancelled,
            _ => AdminOrderFilter::Unpicked,
        }
    }
}

#[derive(Clone)]
pub struct OrderRepository {
    base: BaseRepository,
}

impl OrderRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Parse and table-check an order id string
    pub fn parse_order_id(id: &str) -> RepoResult<RecordId> {
        parse_id(id, TABLE)
    }

    // =========================================================================
    // Create / read
    // =========================================================================

    /// Persist a new order
    ///
    /// totals 在这里强制重算：subtotal 从 items 推导，delivery_fee 取
    /// 服务端常量，total = subtotal + delivery_fee。调用方传入的 totals
    /// 一律覆盖。
    pub async fn create(&self, mut order: Order, delivery_fee: f64) -> RepoResult<Order> {
        let subtotal = money::items_subtotal(&order.items);
        order.totals = money::order_totals(subtotal, delivery_fee);
        order.updated_at = order.created_at;

        let created: Option<Order> = self.base.db().create(TABLE).content(order).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create order".to_string()))
    }

    /// Find order by id
    pub async fn find_by_id(&self, id: &RecordId) -> RepoResult<Option<Order>> {
        let order: Option<Order> = self.base.db().select(id.clone()).await?;
        Ok(order)
    }

    /// Find order by id, erroring when absent
    pub async fn get_by_id(&self, id: &RecordId) -> RepoResult<Order> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Order {} not found", id)))
    }

    // =========================================================================
    // Listings
    // =========================================================================

    /// Orders a driver can claim: Pending, unassigned, and payment-visible
    /// (paid, or cash on delivery), newest first
    pub async fn list_available(&self) -> RepoResult<Vec<Order>> {
        let orders: Vec<Order> = self
            .base
            .db()
            .query(
                "SELECT * FROM order \
                 WHERE delivery.status = $pending \
                   AND delivery.assigned_driver_id IN [NONE, NULL] \
                   AND (payment.status = $paid OR payment.method = 'cash') \
                 ORDER BY created_at DESC",
            )
            .bind(("pending", DeliveryStatus::Pending.as_str()))
            .bind(("paid", PaymentStatus::Paid.as_str()))
            .await?
            .take(0)?;
        Ok(orders)
    }

    /// Orders currently or previously assigned to a driver, newest first
    pub async fn list_for_driver(&self, driver_id: &RecordId) -> RepoResult<Vec<Order>> {
        let orders: Vec<Order> = self
            .base
            .db()
            .query(
                "SELECT * FROM order \
                 WHERE delivery.assigned_driver_id = $driver \
                   AND delivery.status IN ['Claimed', 'PickedUp', 'Delivered'] \
                 ORDER BY created_at DESC",
            )
            .bind(("driver", driver_id.clone()))
            .await?
            .take(0)?;
        Ok(orders)
    }

    /// Admin order listing by filter tab, newest first
    pub async fn list_admin(&self, filter: AdminOrderFilter) -> RepoResult<Vec<Order>> {
        let condition = match filter {
            AdminOrderFilter::Unpicked => {
                "delivery.status = 'Pending' AND delivery.assigned_driver_id IN [NONE, NULL]"
            }
            AdminOrderFilter::Claimed => {
                "delivery.status = 'Claimed' AND delivery.assigned_driver_id NOT IN [NONE, NULL]"
            }
            AdminOrderFilter::PickedUp => "delivery.status = 'PickedUp'",
            AdminOrderFilter::Delivered => "delivery.status = 'Delivered'",
            AdminOrderFilter::Cancelled => "delivery.status = 'Cancelled'",
        };
        let orders: Vec<Order> = self
            .base
            .db()
            .query(format!(
                "SELECT * FROM order WHERE {} ORDER BY created_at DESC",
                condition
            ))
            .await?
            .take(0)?;
        Ok(orders)
    }

    /// Orders carrying a dispute, optionally filtered by dispute status, newest first
    pub async fn list_disputes(&self, status: Option<DisputeStatus>) -> RepoResult<Vec<Order>> {
        let mut query = String::from("SELECT * FROM order WHERE dispute.status != 'None'");
        if status.is_some() {
            query.push_str(" AND dispute.status = $status");
        }
        query.push_str(" ORDER BY created_at DESC");

        let mut q = self.base.db().query(query);
        if let Some(s) = status {
            q = q.bind(("status", s.as_str()));
        }
        let orders: Vec<Order> = q.await?.take(0)?;
        Ok(orders)
    }

    // =========================================================================
    // Conditional state mutations (compare-and-swap)
    // =========================================================================

    /// Atomically claim a Pending, unassigned order for a driver
    ///
    /// Returns the updated order, or `None` when the precondition no longer
    /// holds (already claimed, cancelled, or missing).
    pub async fn claim(
        &self,
        order_id: &RecordId,
        driver_id: &RecordId,
        now: DateTime<Utc>,
    ) -> RepoResult<Option<Order>> {
        let updated: Vec<Order> = self
            .base
            .db()
            .query(
                "UPDATE $order SET \
                     delivery.status = 'Claimed', \
                     delivery.assigned_driver_id = $driver, \
                     delivery.claimed_at = $now, \
                     updated_at = $now \
                 WHERE delivery.status = 'Pending' \
                   AND delivery.assigned_driver_id IN [NONE, NULL] \
                 RETURN AFTER",
            )
            .bind(("order", order_id.clone()))
            .bind(("driver", driver_id.clone()))
            .bind(("now", now))
            .await?
            .take(0)?;
        Ok(updated.into_iter().next())
    }

    /// Atomically advance a claimed/picked-up order owned by this driver
    ///
    /// The target's entry timestamp field is stamped in the same statement.
    /// `expected` is the state the transition table requires right now.
    pub async fn advance(
        &self,
        order_id: &RecordId,
        driver_id: &RecordId,
        expected: DeliveryStatus,
        target: DeliveryStatus,
        now: DateTime<Utc>,
    ) -> RepoResult<Option<Order>> {
        let stamp_field = match target {
            DeliveryStatus::PickedUp => "delivery.picked_up_at",
            DeliveryStatus::Delivered => "delivery.delivered_at",
            other => {
                return Err(RepoError::Validation(format!(
                    "Not a driver-advanceable status: {}",
                    other
                )));
            }
        };

        let updated: Vec<Order> = self
            .base
            .db()
            .query(format!(
                "UPDATE $order SET \
                     delivery.status = $target, \
                     {stamp_field} = $now, \
                     updated_at = $now \
                 WHERE delivery.assigned_driver_id = $driver \
                   AND delivery.status = $expected \
                 RETURN AFTER"
            ))
            .bind(("order", order_id.clone()))
            .bind(("driver", driver_id.clone()))
            .bind(("target", target.as_str()))
            .bind(("expected", expected.as_str()))
            .bind(("now", now))
            .await?
            .take(0)?;
        Ok(updated.into_iter().next())
    }

    /// Atomically cancel a non-terminal order (admin action)
    ///
    /// Clears the driver assignment and every delivery timestamp. Delivered
    /// and Cancelled orders never match the condition.
    pub async fn cancel(
        &self,
        order_id: &RecordId,
        now: DateTime<Utc>,
    ) -> RepoResult<Option<Order>> {
        let updated: Vec<Order> = self
            .base
            .db()
            .query(
                "UPDATE $order SET \
                     delivery.status = 'Cancelled', \
                     delivery.assigned_driver_id = NONE, \
                     delivery.claimed_at = NONE, \
                     delivery.picked_up_at = NONE, \
                     delivery.delivered_at = NONE, \
                     updated_at = $now \
                 WHERE delivery.status NOT IN ['Delivered', 'Cancelled'] \
                 RETURN AFTER",
            )
            .bind(("order", order_id.clone()))
            .bind(("now", now))
            .await?
            .take(0)?;
        Ok(updated.into_iter().next())
    }

    /// Persist the gateway invoice id right after invoice creation
    ///
    /// 无条件写入：崩溃恢复依赖它，订单和外部发票的映射永远可查。
    pub async fn set_invoice_id(
        &self,
        order_id: &RecordId,
        invoice_id: &str,
        now: DateTime<Utc>,
    ) -> RepoResult<Order> {
        let updated: Vec<Order> = self
            .base
            .db()
            .query(
                "UPDATE $order SET payment.invoice_id = $invoice, updated_at = $now RETURN AFTER",
            )
            .bind(("order", order_id.clone()))
            .bind(("invoice", invoice_id.to_string()))
            .bind(("now", now))
            .await?
            .take(0)?;
        updated
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Order {} not found", order_id)))
    }

    /// Atomically move payment status out of `unpaid`
    ///
    /// The `unpaid` precondition is what makes reconciliation idempotent:
    /// a repeated callback no longer matches and returns `None`.
    pub async fn apply_payment_status(
        &self,
        order_id: &RecordId,
        status: PaymentStatus,
        payment_id: &str,
        invoice_id: &str,
        now: DateTime<Utc>,
    ) -> RepoResult<Option<Order>> {
        let updated: Vec<Order> = self
            .base
            .db()
            .query(
                "UPDATE $order SET \
                     payment.status = $status, \
                     payment.payment_id = $payment_id, \
                     payment.invoice_id = $invoice_id, \
                     updated_at = $now \
                 WHERE payment.status = 'unpaid' \
                 RETURN AFTER",
            )
            .bind(("order", order_id.clone()))
            .bind(("status", status.as_str()))
            .bind(("payment_id", payment_id.to_string()))
            .bind(("invoice_id", invoice_id.to_string()))
            .bind(("now", now))
            .await?
            .take(0)?;
        Ok(updated.into_iter().next())
    }

    /// Atomically fail an unpaid payment without touching the external ids
    ///
    /// Used by the gateway's error-redirect path, where no payment id is
    /// delivered. No-ops (returns `None`) when the payment already reached a
    /// terminal status.
    pub async fn mark_payment_failed(
        &self,
        order_id: &RecordId,
        now: DateTime<Utc>,
    ) -> RepoResult<Option<Order>> {
        let updated: Vec<Order> = self
            .base
            .db()
            .query(
                "UPDATE $order SET payment.status = 'failed', updated_at = $now \
                 WHERE payment.status = 'unpaid' \
                 RETURN AFTER",
            )
            .bind(("order", order_id.clone()))
            .bind(("now", now))
            .await?
            .take(0)?;
        Ok(updated.into_iter().next())
    }

    /// Atomically open a dispute on a delivered, dispute-free order
    pub async fn open_dispute(
        &self,
        order_id: &RecordId,
        dispute: DisputeInfo,
        now: DateTime<Utc>,
    ) -> RepoResult<Option<Order>> {
        let updated: Vec<Order> = self
            .base
            .db()
            .query(
                "UPDATE $order SET dispute = $dispute, updated_at = $now \
                 WHERE delivery.status = 'Delivered' \
                   AND dispute.status = 'None' \
                 RETURN AFTER",
            )
            .bind(("order", order_id.clone()))
            .bind(("dispute", dispute))
            .bind(("now", now))
            .await?
            .take(0)?;
        Ok(updated.into_iter().next())
    }

    /// Atomically move an existing dispute to an admin-chosen status
    ///
    /// Only matches when a dispute exists (`status != None`).
    pub async fn resolve_dispute(
        &self,
        order_id: &RecordId,
        status: DisputeStatus,
        notes_admin: &str,
        refund: Option<RefundInfo>,
        now: DateTime<Utc>,
    ) -> RepoResult<Option<Order>> {
        let mut query = String::from(
            "UPDATE $order SET \
                 dispute.status = $status, \
                 dispute.notes_admin = $notes, \
                 dispute.updated_at = $now, \
                 updated_at = $now",
        );
        if refund.is_some() {
            query.push_str(", dispute.refund = $refund");
        }
        query.push_str(" WHERE dispute.status != 'None' RETURN AFTER");

        let mut q = self
            .base
            .db()
            .query(query)
            .bind(("order", order_id.clone()))
            .bind(("status", status.as_str()))
            .bind(("notes", notes_admin.to_string()))
            .bind(("now", now));
        if let Some(r) = refund {
            q = q.bind(("refund", r));
        }
        let updated: Vec<Order> = q.await?.take(0)?;
        Ok(updated.into_iter().next())
    }

    /// Test hook: rewrite `delivered_at` to shift an order into or out of the
    /// dispute window.
    #[cfg(test)]
    pub async fn force_delivered_at(
        &self,
        order_id: &RecordId,
        delivered_at: DateTime<Utc>,
    ) -> RepoResult<()> {
        self.base
            .db()
            .query("UPDATE $order SET delivery.delivered_at = $at")
            .bind(("order", order_id.clone()))
            .bind(("at", delivered_at))
            .await?;
        Ok(())
    }
}
