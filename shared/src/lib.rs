//! Shared types for the delivery marketplace
//!
//! Types consumed by both the backend (`delivery-server`) and the mobile /
//! driver clients: order status vocabularies, the delivery transition table,
//! and the checkout request DTOs. Everything here is plain serde data;
//! database identifiers cross this boundary as `"table:id"` strings.

pub mod order;

pub use order::status::{
    DeliveryStatus, DisputeStatus, NotificationStatus, PaymentMethod, PaymentStatus,
};
pub use order::types::{CartItemInput, CheckoutRequest, CustomerInput, GeoPoint, PickupInput};
