//! Claim protocol and delivery state machine
//!
//! 并发危害只有三类：两个骑手抢同一单、骑手推进与管理员取消竞争、
//! 重复回调。全部用同一招化解：带前置条件的单条 UPDATE。这里负责在
//! 条件未命中时把结果归类成可区分的错误，并维护通知投影。

use chrono::Utc;
use surrealdb::{RecordId, Surreal};
use surrealdb::engine::local::Db;

use shared::order::status::{DeliveryStatus, NotificationStatus};

use crate::db::models::Order;
use crate::db::repository::{NotificationRepository, OrderRepository, parse_id};
use crate::utils::{AppError, AppResult};

/// Delivery workflow service: claims, transitions, cancellation
pub struct DeliveryFlow {
    orders: OrderRepository,
    notifications: NotificationRepository,
}

impl DeliveryFlow {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            orders: OrderRepository::new(db.clone()),
            notifications: NotificationRepository::new(db),
        }
    }

    // =========================================================================
    // Listings
    // =========================================================================

    /// Orders open for claiming, newest first
    pub async fn list_available(&self) -> AppResult<Vec<Order>> {
        Ok(self.orders.list_available().await?)
    }

    /// Orders currently or previously assigned to this driver, newest first
    pub async fn list_for_driver(&self, driver_id: &RecordId) -> AppResult<Vec<Order>> {
        Ok(self.orders.list_for_driver(driver_id).await?)
    }

    // =========================================================================
    // Claim protocol
    // =========================================================================

    /// Driver claims an unassigned Pending order
    ///
    /// Exactly one of any number of concurrent claimants wins; the others
    /// get `Conflict`. A missing order is `NotFound`, a malformed id is
    /// `Validation`; never a generic error.
    pub async fn claim(&self, order_id: &str, driver_id: &RecordId) -> AppResult<Order> {
        let order_id = OrderRepository::parse_order_id(order_id)?;
        let now = Utc::now();

        match self.orders.claim(&order_id, driver_id, now).await? {
            Some(order) => {
                tracing::info!(order_id = %order_id, driver_id = %driver_id, "Order claimed");
                self.project(
                    &order_id,
                    NotificationStatus::Claimed,
                    Some(driver_id.clone()),
                    "Order claimed by driver",
                )
                .await;
                Ok(order)
            }
            None => match self.orders.find_by_id(&order_id).await? {
                None => Err(AppError::not_found(format!("Order {} not found", order_id))),
                Some(_) => Err(AppError::conflict("Order already claimed (or not pending)")),
            },
        }
    }

    /// Admin assigns an order to a driver
    ///
    /// Shares the claim compare-and-swap, so an assignment races cleanly
    /// against a concurrent driver claim and loses with `Conflict`.
    pub async fn assign(&self, order_id: &str, driver_id: &str) -> AppResult<Order> {
        let driver = parse_id(driver_id, "user")
            .map_err(|_| AppError::validation(format!("Invalid driver id: {}", driver_id)))?;
        let order_id = OrderRepository::parse_order_id(order_id)?;
        let now = Utc::now();

        match self.orders.claim(&order_id, &driver, now).await? {
            Some(order) => {
                tracing::info!(order_id = %order_id, driver_id = %driver, "Order assigned to driver");
                self.project(
                    &order_id,
                    NotificationStatus::Claimed,
                    Some(driver),
                    "Order assigned to driver",
                )
                .await;
                Ok(order)
            }
            None => match self.orders.find_by_id(&order_id).await? {
                None => Err(AppError::not_found(format!("Order {} not found", order_id))),
                Some(_) => Err(AppError::conflict("Order already claimed (or not pending)")),
            },
        }
    }

    // =========================================================================
    // Delivery state machine
    // =========================================================================

    /// Driver advances an order along `Claimed → PickedUp → Delivered`
    ///
    /// The transition table decides the required current state; the
    /// conditional update enforces it together with driver ownership.
    pub async fn advance(
        &self,
        order_id: &str,
        driver_id: &RecordId,
        target: DeliveryStatus,
    ) -> AppResult<Order> {
        let order_id = OrderRepository::parse_order_id(order_id)?;

        let Some(expected) = DeliveryStatus::required_current_for(target) else {
            return Err(AppError::invalid_transition(format!(
                "Drivers cannot set status {}",
                target
            )));
        };

        let now = Utc::now();
        match self
            .orders
            .advance(&order_id, driver_id, expected, target, now)
            .await?
        {
            Some(order) => {
                tracing::info!(
                    order_id = %order_id,
                    driver_id = %driver_id,
                    status = target.as_str(),
                    "Delivery status advanced"
                );
                let (status, message) = match target {
                    DeliveryStatus::Delivered => {
                        (NotificationStatus::Delivered, "Order delivered")
                    }
                    _ => (NotificationStatus::Picked, "Order picked up by driver"),
                };
                self.project(&order_id, status, Some(driver_id.clone()), message)
                    .await;
                Ok(order)
            }
            None => {
                // Condition missed: classify against a fresh read. This read
                // is for error reporting only; the atomic attempt already
                // happened.
                let order = self
                    .orders
                    .find_by_id(&order_id)
                    .await?
                    .ok_or_else(|| AppError::not_found(format!("Order {} not found", order_id)))?;

                match order.delivery.assigned_driver_id {
                    Some(ref assigned) if assigned == driver_id => {
                        if order.delivery.status.can_advance_to(target) {
                            // State was right on the re-read, so we lost a race
                            Err(AppError::conflict("Order changed concurrently, retry"))
                        } else {
                            Err(AppError::invalid_transition(format!(
                                "Cannot move order from {} to {}",
                                order.delivery.status, target
                            )))
                        }
                    }
                    _ => Err(AppError::forbidden("Order is not assigned to this driver")),
                }
            }
        }
    }

    /// Admin cancels a non-terminal order
    ///
    /// Delivered orders are not cancellable and Cancelled is terminal; both
    /// surface as `Conflict`. Clears the driver and all delivery timestamps.
    pub async fn cancel(&self, order_id: &str) -> AppResult<Order> {
        let order_id = OrderRepository::parse_order_id(order_id)?;
        let now = Utc::now();

        match self.orders.cancel(&order_id, now).await? {
            Some(order) => {
                tracing::info!(order_id = %order_id, "Order cancelled by admin");
                self.project(
                    &order_id,
                    NotificationStatus::Cancelled,
                    None,
                    "Order cancelled by admin",
                )
                .await;
                Ok(order)
            }
            None => match self.orders.find_by_id(&order_id).await? {
                None => Err(AppError::not_found(format!("Order {} not found", order_id))),
                Some(order) => Err(AppError::conflict(format!(
                    "Order is {} and cannot be cancelled",
                    order.delivery.status
                ))),
            },
        }
    }

    // =========================================================================
    // Notification projection (best-effort)
    // =========================================================================

    /// Upsert the notification projection; failures are logged, never
    /// propagated; the authoritative order mutation already committed.
    async fn project(
        &self,
        order_id: &RecordId,
        status: NotificationStatus,
        driver_id: Option<RecordId>,
        message: &str,
    ) {
        if let Err(e) = self
            .notifications
            .upsert_by_order(order_id, status, driver_id, message, Utc::now())
            .await
        {
            tracing::warn!(
                order_id = %order_id,
                status = status.as_str(),
                error = %e,
                "Notification projection update failed"
            );
        }
    }
}
