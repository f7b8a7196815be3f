//! Admin Console Models

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{cart::models::Coupon, catalog::models::Product};

// =============================================================================
// Request Bodies
// =============================================================================

/// Coupon create/update body. Dates are ISO 8601 strings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponInput {
    pub code: String,
    pub discount_percentage: f64,
    pub minimum_cart_value: f64,
    pub start_date: String,
    pub end_date: String,
    pub is_active: bool,
}

// =============================================================================
// Dashboard
// =============================================================================

/// Aggregates computed by the backend for the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardMetrics {
    pub total_orders: u64,
    pub orders_by_status: HashMap<String, u64>,
    pub total_sales: f64,
    pub low_stock_products: u64,
    pub coupon_usage: u64,
    pub total_customers: u64,
    pub total_items_sold: u64,
    pub products_in_inventory: u64,
}

/// `GET /admin/dashboard` body.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DashboardResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub metrics: DashboardMetrics,
}

// =============================================================================
// Records
// =============================================================================

/// A server record addressed by id in admin lists.
pub trait Record: Clone {
    fn record_id(&self) -> &str;
}

impl Record for Coupon {
    fn record_id(&self) -> &str {
        &self.id
    }
}

impl Record for Product {
    fn record_id(&self) -> &str {
        &self.id
    }
}
