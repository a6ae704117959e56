//! Money arithmetic for order totals
//!
//! Amounts rest as `f64` on the wire and in storage, but every computation
//! runs through `rust_decimal` and is rounded to 2 decimal places, so
//! `0.1 + 0.2`-style drift never reaches a persisted total.

use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};

use crate::db::models::{OrderItem, OrderTotals};

/// Convert an f64 amount into Decimal (non-finite input collapses to zero)
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or(Decimal::ZERO)
}

/// Convert back to f64 after rounding to 2 decimal places
pub fn to_f64(value: Decimal) -> f64 {
    value.round_dp(2).to_f64().unwrap_or(0.0)
}

/// The unit price to snapshot for a cart line
///
/// Offer price wins only while the offer flag is set and the offer price is
/// positive; otherwise the regular price applies.
pub fn effective_unit_price(price: f64, offer: bool, offer_price: Option<f64>) -> f64 {
    match offer_price {
        Some(op) if offer && op > 0.0 => op,
        _ => price,
    }
}

/// Sum of `price_snapshot * qty` over the items
pub fn items_subtotal(items: &[OrderItem]) -> f64 {
    let total = items.iter().fold(Decimal::ZERO, |acc, item| {
        acc + to_decimal(item.price_snapshot) * Decimal::from(item.qty)
    });
    to_f64(total)
}

/// Authoritative totals: `total = subtotal + delivery_fee`
pub fn order_totals(subtotal: f64, delivery_fee: f64) -> OrderTotals {
    let subtotal_d = to_decimal(subtotal);
    let fee_d = to_decimal(delivery_fee);
    OrderTotals {
        subtotal: to_f64(subtotal_d),
        delivery_fee: to_f64(fee_d),
        total: to_f64(subtotal_d + fee_d),
    }
}
