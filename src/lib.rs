//! Storefront Client Library
//!
//! Client-side state for a REST storefront backend: a local mirror of the
//! cart, the coupon flow, orders, the catalog, the signed-in session and
//! the admin consoles. The backend owns every business rule; the stores
//! here only cache what it answers.

// Domain modules
pub mod admin;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod orders;

// Infrastructure
pub mod cli;
pub mod config;
pub mod error;
pub mod storefront;
pub mod telemetry;
pub mod tracker;
pub mod transport;

pub use error::{ApiError, Rejection, StoreError};
pub use storefront::Storefront;
