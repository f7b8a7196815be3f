//! Order Domain Models

use serde::{Deserialize, Serialize};

use crate::{cart::models::Coupon, catalog::models::Product};

/// Lifecycle of an order.
///
/// Serialized with the labels the backend uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    #[serde(rename = "Order Placed")]
    Placed,
    Packed,
    Shipping,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Placed,
        Self::Packed,
        Self::Shipping,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// Whether a customer may still cancel.
    ///
    /// Used to gate the cancel action; the server has the final word.
    pub fn is_cancellable(self) -> bool {
        matches!(self, Self::Placed | Self::Packed | Self::Shipping)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Placed => "Order Placed",
            Self::Packed => "Packed",
            Self::Shipping => "Shipping",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| {
                status.label().eq_ignore_ascii_case(value)
                    || format!("{status:?}").eq_ignore_ascii_case(value)
            })
            .ok_or_else(|| format!("unknown order status: {value}"))
    }
}

/// A line of an order, frozen at purchase time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(default)]
    pub id: String,
    pub product: Option<Product>,
    pub name: Option<String>,
    pub price: f64,
    pub quantity: u32,
    pub image: Option<String>,
}

impl OrderItem {
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.product.as_ref().map(|product| product.name.as_str()))
            .unwrap_or("Unknown product")
    }
}

/// Customer summary attached to an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCustomer {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mobile_number: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub user: Option<OrderCustomer>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    pub status: OrderStatus,
    #[serde(default)]
    pub subtotal: f64,
    #[serde(default)]
    pub tax: f64,
    #[serde(default)]
    pub discount: f64,
    #[serde(default)]
    pub total: f64,
    pub coupon: Option<Coupon>,
    #[serde(default)]
    pub shipping_address: String,
    #[serde(default)]
    pub created_at: String,
    pub updated_at: Option<String>,
}

/// Body of `POST /orders`.
#[derive(Debug, Default, Serialize)]
pub struct PlaceOrderRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Body of `PUT /admin/orders/{id}/status`.
#[derive(Debug, Serialize)]
pub struct StatusUpdateRequest {
    pub status: OrderStatus,
}
