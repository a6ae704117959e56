//! Workflow test suites
//!
//! Drive the real checkout/claim/lifecycle/dispute/reconcile services
//! against an in-memory store and a scriptable gateway double.

mod test_claim;
mod test_payments;

use std::sync::Arc;

use chrono::{Duration, Utc};
use surrealdb::RecordId;

use shared::order::status::{
    DeliveryStatus, DisputeStatus, NotificationStatus, PaymentMethod, PaymentStatus,
};
use shared::order::types::{CartItemInput, CheckoutRequest, CustomerInput, GeoPoint};

use crate::core::{Config, ServerState};
use crate::db::models::Order;
use crate::payments::gateway::mock::MockGateway;
use crate::payments::gateway::{GatewayError, GatewayPaymentStatus, InvoiceCreated};
use crate::utils::AppError;

pub const TEST_PHONE: &str = "50000000";

struct TestContext {
    state: ServerState,
    gateway: Arc<MockGateway>,
}

/// In-memory state with the default fee (10.0) and window (24h)
async fn test_context() -> TestContext {
    test_context_with(10.0, 24).await
}

async fn test_context_with(delivery_fee: f64, dispute_window_hours: i64) -> TestContext {
    let mut config = Config::with_overrides(delivery_fee, dispute_window_hours);
    config.jwt_secret = "test-secret".into();
    config.currency = "QAR".into();
    config.app_base_url = "http://localhost:4000".into();

    let gateway = Arc::new(MockGateway::new());
    let state = ServerState::in_memory(config, gateway.clone()).await;
    TestContext { state, gateway }
}

fn driver(n: u32) -> RecordId {
    RecordId::from_table_key("user", format!("driver{n}"))
}

fn cart_item(price: f64, qty: i64) -> CartItemInput {
    CartItemInput {
        product_id: "product:p1".into(),
        store_id: Some("store:s1".into()),
        category: Some("grocery".into()),
        name: "Test Item".into(),
        price,
        offer: false,
        offer_price: None,
        quantity: qty,
        image: None,
    }
}

fn checkout_request(items: Vec<CartItemInput>, method: PaymentMethod) -> CheckoutRequest {
    CheckoutRequest {
        customer: CustomerInput {
            name: "Amal".into(),
            phone: TEST_PHONE.into(),
            address_text: "Zone 4, Street 9".into(),
            location: GeoPoint::default(),
        },
        cart_items: items,
        pickup: None,
        payment_method: method,
    }
}

/// Place a cash order (claimable without any payment step)
async fn place_cash_order(ctx: &TestContext) -> Order {
    ctx.state
        .checkout_service()
        .place_order(checkout_request(
            vec![cart_item(18.0, 1), cart_item(25.0, 2)],
            PaymentMethod::Cash,
        ))
        .await
        .expect("checkout failed")
}

/// Place a gateway-paid order (starts unpaid)
async fn place_gateway_order(ctx: &TestContext) -> Order {
    ctx.state
        .checkout_service()
        .place_order(checkout_request(
            vec![cart_item(18.0, 1), cart_item(25.0, 2)],
            PaymentMethod::Gateway,
        ))
        .await
        .expect("checkout failed")
}

/// Claim and advance an order all the way to Delivered
async fn deliver_order(ctx: &TestContext, order_id: &str, driver_id: &RecordId) -> Order {
    let flow = ctx.state.delivery_flow();
    flow.claim(order_id, driver_id).await.expect("claim failed");
    flow.advance(order_id, driver_id, DeliveryStatus::PickedUp)
        .await
        .expect("pickup failed");
    flow.advance(order_id, driver_id, DeliveryStatus::Delivered)
        .await
        .expect("deliver failed")
}

/// Fresh read of an order by its id string
async fn reload(ctx: &TestContext, order_id: &str) -> Order {
    let record_id = crate::db::repository::OrderRepository::parse_order_id(order_id).unwrap();
    ctx.state
        .order_repo()
        .get_by_id(&record_id)
        .await
        .expect("order vanished")
}
