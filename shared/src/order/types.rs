//! Checkout request DTOs
//!
//! The explicit cart payload the mobile client submits at checkout. This
//! replaces any session-held cart: everything the server needs to create an
//! order arrives in one request.

use serde::{Deserialize, Serialize};

use super::status::PaymentMethod;

/// Latitude/longitude pair; both components optional
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub struct GeoPoint {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

/// Customer block of a checkout request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerInput {
    pub name: String,
    pub phone: String,
    pub address_text: String,
    #[serde(default)]
    pub location: GeoPoint,
}

/// Optional pickup/store block of a checkout request
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PickupInput {
    /// Store id as a `"store:…"` string
    #[serde(default)]
    pub store_id: Option<String>,
    #[serde(default)]
    pub address_text: String,
    #[serde(default)]
    pub location: GeoPoint,
}

/// One cart line as submitted by the client
///
/// `price`/`offer`/`offer_price` describe the catalog entry the client saw;
/// the server decides the snapshot price (offer price wins only while the
/// offer is active and positive) and never trusts client-side totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItemInput {
    /// Product id as a `"product:…"` string
    pub product_id: String,
    /// Store id as a `"store:…"` string
    #[serde(default)]
    pub store_id: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub offer: bool,
    #[serde(default)]
    pub offer_price: Option<f64>,
    pub quantity: i64,
    #[serde(default)]
    pub image: Option<String>,
}

/// Full checkout request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub customer: CustomerInput,
    pub cart_items: Vec<CartItemInput>,
    #[serde(default)]
    pub pickup: Option<PickupInput>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkout_request_roundtrip() {
        let req = CheckoutRequest {
            customer: CustomerInput {
                name: "Amal".into(),
                phone: "50000000".into(),
                address_text: "Zone 4, Street 9".into(),
                location: GeoPoint { lat: Some(25.28), lng: Some(51.53) },
            },
            cart_items: vec![CartItemInput {
                product_id: "product:abc".into(),
                store_id: Some("store:xyz".into()),
                category: Some("grocery".into()),
                name: "Dates 500g".into(),
                price: 18.0,
                offer: false,
                offer_price: None,
                quantity: 1,
                image: None,
            }],
            pickup: None,
            payment_method: PaymentMethod::Cash,
        };

        let json = serde_json::to_string(&req).unwrap();
        let back: CheckoutRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back.cart_items.len(), 1);
        assert_eq!(back.payment_method, PaymentMethod::Cash);
    }

    #[test]
    fn defaults_fill_optional_blocks() {
        // A minimal client payload: no pickup, no location, gateway payment
        let json = r#"{
            "customer": {"name": "A", "phone": "5", "address_text": "x"},
            "cart_items": [{"product_id": "product:1", "name": "Water", "price": 2.5, "quantity": 3}]
        }"#;
        let req: CheckoutRequest = serde_json::from_str(json).unwrap();
        assert!(req.pickup.is_none());
        assert_eq!(req.payment_method, PaymentMethod::Gateway);
        assert_eq!(req.customer.location, GeoPoint::default());
        assert!(!req.cart_items[0].offer);
    }
}
