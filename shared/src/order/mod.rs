//! Order domain vocabulary
//!
//! - [`status`] - 状态枚举和配送状态转换表
//! - [`types`] - 结账请求 DTO

pub mod status;
pub mod types;

pub use status::{DeliveryStatus, DisputeStatus, NotificationStatus, PaymentMethod, PaymentStatus};
pub use types::{CartItemInput, CheckoutRequest, CustomerInput, GeoPoint, PickupInput};
