//! Notification Repository
//!
//! 按 order 作 upsert 的投影写入。投影失败只记日志，绝不回滚触发它的
//! 订单变更——这里不是事实来源。

use chrono::{DateTime, Utc};
use surrealdb::{RecordId, Surreal};
use surrealdb::engine::local::Db;

use shared::order::status::NotificationStatus;

use crate::db::models::Notification;

use super::{BaseRepository, RepoResult};

const TABLE: &str = "notification";

#[derive(Clone)]
pub struct NotificationRepository {
    base: BaseRepository,
}

impl NotificationRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Deterministic projection record id for an order
    ///
    /// One row per order: upserts from concurrent transitions land on the
    /// same record instead of accumulating duplicates.
    fn projection_id(order_id: &RecordId) -> RecordId {
        RecordId::from_table_key(TABLE, order_id.key().to_string())
    }

    /// Upsert the projection row for an order
    pub async fn upsert_by_order(
        &self,
        order_id: &RecordId,
        status: NotificationStatus,
        driver_id: Option<RecordId>,
        message: &str,
        now: DateTime<Utc>,
    ) -> RepoResult<Notification> {
        let id = Self::projection_id(order_id);
        let rows: Vec<Notification> = self
            .base
            .db()
            .query(
                "UPSERT $id SET \
                     order_id = $order, \
                     driver_id = $driver, \
                     status = $status, \
                     message = $message, \
                     created_at = created_at ?? $now, \
                     updated_at = $now \
                 RETURN AFTER",
            )
            .bind(("id", id))
            .bind(("order", order_id.clone()))
            .bind(("driver", driver_id))
            .bind(("status", status.as_str()))
            .bind(("message", message.to_string()))
            .bind(("now", now))
            .await?
            .take(0)?;
        rows.into_iter()
            .next()
            .ok_or_else(|| super::RepoError::Database("Notification upsert returned nothing".into()))
    }

    /// Projection row for one order, if any
    pub async fn find_by_order(&self, order_id: &RecordId) -> RepoResult<Option<Notification>> {
        let row: Option<Notification> =
            self.base.db().select(Self::projection_id(order_id)).await?;
        Ok(row)
    }

    /// A driver's notifications, newest first, bounded
    pub async fn list_for_driver(&self, driver_id: &RecordId) -> RepoResult<Vec<Notification>> {
        let rows: Vec<Notification> = self
            .base
            .db()
            .query(
                "SELECT * FROM notification WHERE driver_id = $driver \
                 ORDER BY created_at DESC LIMIT 50",
            )
            .bind(("driver", driver_id.clone()))
            .await?
            .take(0)?;
        Ok(rows)
    }
}
