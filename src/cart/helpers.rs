//! Shopping Cart Merge Helpers
//!
//! Pure functions that fold a server response into the local cart. Each
//! store operation has its own merge rule; keeping them here makes the
//! rules testable without a transport.

use serde_json::Value;

use super::models::{Cart, CartItem, CartPayload, Coupon};
use crate::transport::helpers::unwrap_key;

/// Decodes a cart snapshot that may be nested under `cart` or flat.
pub fn decode_cart_payload(body: Value) -> Result<CartPayload, serde_json::Error> {
    match unwrap_key(body, "cart") {
        Value::Null => Ok(CartPayload::default()),
        data => serde_json::from_value(data),
    }
}

/// Decodes the snapshot under `cart`, if the response carried one.
pub fn nested_cart_payload(body: &Value) -> Result<Option<CartPayload>, serde_json::Error> {
    match body.get("cart") {
        Some(cart) if cart.is_object() => serde_json::from_value(cart.clone()).map(Some),
        _ => Ok(None),
    }
}

/// Builds a cart from a snapshot, replacing every field.
///
/// Missing items read as empty and missing amounts as zero.
pub fn replace_cart(payload: CartPayload) -> Cart {
    let applied_coupon = payload.coupon().cloned();

    Cart {
        items: payload.items.unwrap_or_default(),
        subtotal: payload.subtotal.unwrap_or_default(),
        tax: payload.tax.unwrap_or_default(),
        discount: payload.discount.unwrap_or_default(),
        total: payload.total.unwrap_or_default(),
        applied_coupon,
    }
}

/// Folds a successful apply-coupon response into `current`.
///
/// Amounts the response omits are kept, except the discount which resets
/// to zero. The coupon comes from the cart data, or from a `coupon` next
/// to a nested cart.
pub fn merge_applied_coupon(current: &Cart, payload: CartPayload, top_level: Option<Coupon>) -> Cart {
    let applied_coupon = payload.coupon().cloned().or(top_level);

    Cart {
        items: payload.items.unwrap_or_else(|| current.items.clone()),
        subtotal: payload.subtotal.unwrap_or(current.subtotal),
        tax: payload.tax.unwrap_or(current.tax),
        discount: payload.discount.unwrap_or_default(),
        total: payload.total.unwrap_or(current.total),
        applied_coupon,
    }
}

/// Folds a successful remove-coupon response into `current`.
///
/// Without a total in the response, the total falls back to
/// `subtotal + tax`. The coupon is always cleared.
pub fn merge_removed_coupon(current: &Cart, payload: CartPayload) -> Cart {
    let subtotal = payload.subtotal.unwrap_or(current.subtotal);
    let tax = payload.tax.unwrap_or(current.tax);

    Cart {
        items: payload.items.unwrap_or_else(|| current.items.clone()),
        subtotal,
        tax,
        discount: payload.discount.unwrap_or_default(),
        total: payload.total.unwrap_or(subtotal + tax),
        applied_coupon: None,
    }
}

/// Reads a coupon placed beside a nested cart.
pub fn top_level_coupon(body: &Value) -> Option<Coupon> {
    body.get("cart")?;
    body.get("coupon")
        .filter(|coupon| coupon.is_object())
        .and_then(|coupon| serde_json::from_value(coupon.clone()).ok())
}

/// Coupon codes are matched case-insensitively by submitting them upper case.
pub fn normalize_coupon_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// One-line summary of the cart lines, e.g. `"1x Kettle, 2x Mug"`.
pub fn format_item_summary(items: &[CartItem]) -> String {
    items
        .iter()
        .map(|item| format!("{}x {}", item.quantity, item.product.name))
        .collect::<Vec<_>>()
        .join(", ")
}
