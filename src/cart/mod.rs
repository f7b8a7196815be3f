//! Shopping Cart Domain Module
//!
//! This module contains the client side of the shopping cart, including:
//! - Domain models (Cart, CartItem, Coupon, wire payloads)
//! - Merge helpers that fold server responses into the local cart
//! - `CartStore`, the local mirror with coupon flow and pending-update tracking

pub mod helpers;
pub mod models;
pub mod state;

// Re-export commonly used types for convenience
pub use models::{Cart, CartItem, Coupon};
pub use state::{CartOperation, CartStore, CouponPhase};
