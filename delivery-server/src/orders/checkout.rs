//! Checkout workflow
//!
//! Turns an explicit cart payload into a persisted order. The cart arrives
//! in the request body; the server holds no session cart. Line items are
//! snapshotted here (name, category, unit price, image) so later catalog
//! edits never change historical orders.

use chrono::Utc;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use shared::order::types::{CartItemInput, CheckoutRequest};

use crate::db::models::{Customer, DeliveryInfo, DisputeInfo, Order, OrderItem, PaymentInfo, Pickup};
use crate::db::repository::{OrderRepository, parse_id};
use crate::orders::money;
use crate::utils::validation::{
    MAX_ADDRESS_LEN, MAX_NAME_LEN, MAX_SHORT_TEXT_LEN, MAX_URL_LEN, validate_amount,
    validate_optional_text, validate_quantity, validate_required_text,
};
use crate::utils::{AppError, AppResult};

/// Checkout service
pub struct CheckoutService {
    orders: OrderRepository,
    delivery_fee: f64,
}

impl CheckoutService {
    pub fn new(db: Surreal<Db>, delivery_fee: f64) -> Self {
        Self {
            orders: OrderRepository::new(db),
            delivery_fee,
        }
    }

    /// Validate the request and create the order
    ///
    /// The created order starts at `delivery = Pending`, `payment = unpaid`,
    /// `dispute = None`. Totals are recomputed server-side from the item
    /// snapshots plus the configured delivery fee.
    pub async fn place_order(&self, req: CheckoutRequest) -> AppResult<Order> {
        validate_required_text(&req.customer.name, "customer.name", MAX_NAME_LEN)?;
        validate_required_text(&req.customer.phone, "customer.phone", MAX_SHORT_TEXT_LEN)?;
        validate_required_text(&req.customer.address_text, "customer.address_text", MAX_ADDRESS_LEN)?;

        if req.cart_items.is_empty() {
            return Err(AppError::validation("cart_items is required"));
        }

        let mut items = Vec::with_capacity(req.cart_items.len());
        for (idx, line) in req.cart_items.iter().enumerate() {
            items.push(snapshot_item(line, idx)?);
        }

        let pickup = match req.pickup {
            Some(p) => {
                let store_id = match p.store_id {
                    Some(ref s) => Some(parse_id(s, "store")?),
                    None => None,
                };
                Pickup {
                    store_id,
                    address_text: p.address_text,
                    location: p.location,
                }
            }
            None => Pickup::default(),
        };

        let now = Utc::now();
        let order = Order {
            id: None,
            customer: Customer {
                name: req.customer.name.trim().to_string(),
                phone: req.customer.phone.trim().to_string(),
                address_text: req.customer.address_text.trim().to_string(),
                location: req.customer.location,
            },
            pickup,
            items,
            // Overwritten by the repository; never trusted from the client
            totals: Default::default(),
            payment: PaymentInfo {
                method: req.payment_method,
                ..Default::default()
            },
            delivery: DeliveryInfo::default(),
            dispute: DisputeInfo::default(),
            created_at: now,
            updated_at: now,
        };

        let created = self.orders.create(order, self.delivery_fee).await?;
        tracing::info!(
            order_id = %created.id_string(),
            total = created.totals.total,
            method = created.payment.method.as_str(),
            "Order created"
        );
        Ok(created)
    }
}

/// Build the immutable snapshot for one cart line
fn snapshot_item(line: &CartItemInput, idx: usize) -> AppResult<OrderItem> {
    let product_id = parse_id(&line.product_id, "product")
        .map_err(|_| AppError::validation(format!("Invalid product id: {}", line.product_id)))?;
    let store_id = match line.store_id {
        Some(ref s) => Some(parse_id(s, "store")?),
        None => None,
    };

    validate_required_text(&line.name, &format!("cart_items[{idx}].name"), MAX_NAME_LEN)?;
    validate_quantity(line.quantity, &format!("cart_items[{idx}].quantity"))?;
    validate_amount(line.price, &format!("cart_items[{idx}].price"))?;
    if let Some(op) = line.offer_price
        && !op.is_finite()
    {
        return Err(AppError::validation(format!(
            "cart_items[{idx}].offer_price must be a number"
        )));
    }
    validate_optional_text(&line.image, &format!("cart_items[{idx}].image"), MAX_URL_LEN)?;

    Ok(OrderItem {
        product_id,
        store_id,
        category: line
            .category
            .clone()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| "unknown".to_string()),
        name_snapshot: line.name.clone(),
        price_snapshot: money::effective_unit_price(line.price, line.offer, line.offer_price),
        qty: line.quantity,
        image_snapshot: line.image.clone().unwrap_or_default(),
    })
}
