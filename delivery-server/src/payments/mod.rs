//! Payment subsystem
//!
//! - [`gateway`] - 网关 collaborator (trait + HTTP 实现 + 响应适配)
//! - [`reconcile`] - 发起支付与回调对账

pub mod gateway;
pub mod reconcile;

pub use gateway::{GatewayError, HttpPaymentGateway, LookupKey, PaymentGateway};
pub use reconcile::{InitiatedPayment, PaymentReconciler, ReconcileOutcome, ReconcilerSettings};
