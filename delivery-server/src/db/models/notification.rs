//! Notification Model
//!
//! 订单状态的去规范化投影，按 order_id 唯一。只用于驱动 admin/driver
//! 界面，不是配送状态的事实来源。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use shared::order::status::NotificationStatus;

use super::serde_helpers;

/// Best-effort notification projection row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    #[serde(with = "serde_helpers::record_id")]
    pub order_id: RecordId,
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub driver_id: Option<RecordId>,
    pub status: NotificationStatus,
    #[serde(default)]
    pub message: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}
