pub mod models;
pub mod state;

pub use models::{PriceRange, Product, ProductFilters, ProductInput};
pub use state::{CatalogOperation, CatalogStore};
