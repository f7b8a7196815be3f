//! Order Domain Module
//!
//! - Domain models (Order, OrderItem, OrderStatus, request bodies)
//! - `OrderStore`: order placement, listing, detail and cancellation

pub mod models;
pub mod state;

pub use models::{Order, OrderItem, OrderStatus};
pub use state::{OrderOperation, OrderStore};
