//! Database models

pub mod notification;
pub mod order;
pub mod serde_helpers;

pub use notification::Notification;
pub use order::{
    Customer, DeliveryInfo, DisputeInfo, Order, OrderItem, OrderTotals, PaymentInfo, Pickup,
    RefundInfo,
};
