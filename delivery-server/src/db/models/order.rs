//! Order Model
//!
//! 订单聚合根。items 为下单时的不可变快照，后续目录编辑不影响历史订单。
//! 所有状态变更都经由 OrderRepository 的条件更新完成。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use shared::order::status::{DeliveryStatus, DisputeStatus, PaymentMethod, PaymentStatus};
use shared::order::types::GeoPoint;

use super::serde_helpers;

// =============================================================================
// Order (聚合根)
// =============================================================================

/// Customer block; `phone` is the ownership key for disputes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub name: String,
    pub phone: String,
    pub address_text: String,
    #[serde(default)]
    pub location: GeoPoint,
}

/// Pickup snapshot (optional store reference + address at order time)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Pickup {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub store_id: Option<RecordId>,
    #[serde(default)]
    pub address_text: String,
    #[serde(default)]
    pub location: GeoPoint,
}

/// Immutable line-item snapshot captured at order creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(with = "serde_helpers::record_id")]
    pub product_id: RecordId,
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub store_id: Option<RecordId>,
    pub category: String,
    pub name_snapshot: String,
    /// Unit price at order time (offer price when the offer was active)
    pub price_snapshot: f64,
    pub qty: i64,
    #[serde(default)]
    pub image_snapshot: String,
}

/// Order totals
///
/// `delivery_fee` 是服务端常量，`total` 在每次保存时重新计算覆盖，
/// 客户端提交的 total 永远不会原样入库。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct OrderTotals {
    pub subtotal: f64,
    pub delivery_fee: f64,
    pub total: f64,
}

/// Payment block
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PaymentInfo {
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    /// External invoice id, persisted as soon as the gateway returns it
    #[serde(default)]
    pub invoice_id: String,
    /// External payment id from the callback
    #[serde(default)]
    pub payment_id: String,
}

/// Delivery block, the state machine data
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DeliveryInfo {
    pub status: DeliveryStatus,
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub assigned_driver_id: Option<RecordId>,
    #[serde(default)]
    pub claimed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub picked_up_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub delivered_at: Option<DateTime<Utc>>,
}

/// Refund sub-object of a dispute
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RefundInfo {
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub refund_id: String,
    #[serde(default)]
    pub refunded_at: Option<DateTime<Utc>>,
}

/// Dispute block
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DisputeInfo {
    pub status: DisputeStatus,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub notes_customer: String,
    #[serde(default)]
    pub notes_admin: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub refund: RefundInfo,
}

/// The order aggregate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    pub customer: Customer,
    #[serde(default)]
    pub pickup: Pickup,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub totals: OrderTotals,
    #[serde(default)]
    pub payment: PaymentInfo,
    #[serde(default)]
    pub delivery: DeliveryInfo,
    #[serde(default)]
    pub dispute: DisputeInfo,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Record id as `"order:…"` string (empty for unsaved orders)
    pub fn id_string(&self) -> String {
        self.id.as_ref().map(|id| id.to_string()).unwrap_or_default()
    }
}
