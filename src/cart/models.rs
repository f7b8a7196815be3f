//! Shopping Cart Domain Models
//!
//! This module contains the cart data structures as held locally and as
//! they arrive from the backend.

use serde::{Deserialize, Serialize};

use crate::catalog::models::Product;

// =============================================================================
// Cart Domain Models
// =============================================================================

/// One line of the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    /// Server-side identifier of the line.
    #[serde(default)]
    pub id: String,

    /// Snapshot of the product this line refers to.
    pub product: Product,

    /// Units of the product; bounded by stock on the server.
    pub quantity: u32,
}

impl CartItem {
    /// True when the server would refuse another unit.
    ///
    /// Callers use this to disable the increment control; nothing is
    /// enforced locally.
    pub fn at_stock_limit(&self) -> bool {
        self.quantity >= self.product.stock
    }
}

/// A coupon as returned by the server. Treated as an opaque value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    #[serde(default)]
    pub id: String,
    pub code: String,
    #[serde(default)]
    pub discount_percentage: f64,
    #[serde(default)]
    pub minimum_cart_value: f64,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub is_active: bool,
}

/// The local mirror of the remote cart.
///
/// Every amount is the server's number; none is recomputed here.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub items: Vec<CartItem>,
    pub subtotal: f64,
    pub tax: f64,
    pub discount: f64,
    pub total: f64,
    pub applied_coupon: Option<Coupon>,
}

impl Cart {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item(&self, product_id: &str) -> Option<&CartItem> {
        self.items.iter().find(|item| item.product.id == product_id)
    }
}

// =============================================================================
// Wire Models
// =============================================================================

/// A cart snapshot as sent by the server; any field may be missing.
///
/// The applied coupon is named `coupon` by some endpoints and
/// `appliedCoupon` by others.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartPayload {
    pub items: Option<Vec<CartItem>>,
    pub subtotal: Option<f64>,
    pub tax: Option<f64>,
    pub discount: Option<f64>,
    pub total: Option<f64>,
    pub coupon: Option<Coupon>,
    pub applied_coupon: Option<Coupon>,
}

impl CartPayload {
    /// The applied coupon, whichever field carried it.
    pub fn coupon(&self) -> Option<&Coupon> {
        self.coupon.as_ref().or(self.applied_coupon.as_ref())
    }
}

/// Body of `POST /cart/items`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest<'a> {
    pub product_id: &'a str,
    pub quantity: u32,
}

/// Body of `PUT /cart/items/{productId}`.
#[derive(Debug, Serialize)]
pub struct UpdateQuantityRequest {
    pub quantity: u32,
}

/// Body of `POST /cart/coupon`.
#[derive(Debug, Serialize)]
pub struct ApplyCouponRequest<'a> {
    pub code: &'a str,
}
