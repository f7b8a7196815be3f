//! Admin Console Module
//!
//! Stores behind the admin pages. Each one owns a single resource:
//! - `AdminOrderStore` for every customer's orders and their status
//! - `AdminCouponStore` and `AdminProductStore` for CRUD consoles
//! - `DashboardStore` for the aggregated metrics

pub mod coupons;
pub mod dashboard;
pub mod helpers;
pub mod models;
pub mod orders;
pub mod products;

pub use coupons::{AdminCouponOperation, AdminCouponStore};
pub use dashboard::{DashboardOperation, DashboardStore};
pub use models::{CouponInput, DashboardMetrics};
pub use orders::{AdminOrderOperation, AdminOrderStore};
pub use products::{AdminProductOperation, AdminProductStore};
