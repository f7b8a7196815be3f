//! Product Catalog State
//!
//! Caches the product list and applies category and price filters locally;
//! the filtered view is recomputed whenever the list or a filter changes.

use std::sync::Arc;

use reqwest::Method;
use tokio::sync::RwLock;

use super::models::{PriceRange, Product, ProductFilters, ALL_CATEGORIES};
use crate::{
    error::StoreError,
    tracker::{Operation, OperationStatus, OperationTracker},
    transport::{
        helpers::{decode_list, unwrap_key},
        RemoteApi,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogOperation {
    FetchProducts,
    FetchProduct,
    FetchCategories,
}

impl Operation for CatalogOperation {
    fn fallback_message(self) -> &'static str {
        match self {
            Self::FetchProducts => "Failed to fetch products",
            Self::FetchProduct => "Failed to fetch product",
            Self::FetchCategories => "Failed to fetch categories",
        }
    }
}

#[derive(Debug, Default)]
struct CatalogState {
    products: Vec<Product>,
    filtered: Vec<Product>,
    categories: Vec<String>,
    selected: Option<Product>,
    filters: ProductFilters,
}

impl CatalogState {
    fn refilter(&mut self) {
        self.filtered = self
            .products
            .iter()
            .filter(|product| self.filters.matches(product))
            .cloned()
            .collect();
    }
}

/// Local cache of the product catalog.
pub struct CatalogStore {
    api: Arc<dyn RemoteApi>,
    state: RwLock<CatalogState>,
    operations: OperationTracker<CatalogOperation>,
}

impl std::fmt::Debug for CatalogStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogStore")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl CatalogStore {
    pub fn new(api: Arc<dyn RemoteApi>) -> Self {
        Self {
            api,
            state: RwLock::new(CatalogState::default()),
            operations: OperationTracker::new(),
        }
    }

    pub async fn products(&self) -> Vec<Product> {
        self.state.read().await.products.clone()
    }

    /// Products passing the active filters.
    pub async fn filtered_products(&self) -> Vec<Product> {
        self.state.read().await.filtered.clone()
    }

    pub async fn categories(&self) -> Vec<String> {
        self.state.read().await.categories.clone()
    }

    pub async fn selected(&self) -> Option<Product> {
        self.state.read().await.selected.clone()
    }

    pub async fn filters(&self) -> ProductFilters {
        self.state.read().await.filters.clone()
    }

    pub async fn error(&self) -> Option<String> {
        self.operations.error().await
    }

    pub async fn clear_error(&self) {
        self.operations.clear_error().await;
    }

    pub fn status(&self, op: CatalogOperation) -> OperationStatus {
        self.operations.status(op)
    }

    pub fn is_loading(&self) -> bool {
        self.operations.is_loading()
    }

    pub async fn fetch_products(&self) -> Result<Vec<Product>, StoreError> {
        let op = CatalogOperation::FetchProducts;
        let call = self.operations.begin(op).await;

        let result = self.load_list("/products", "products").await;
        let products: Vec<Product> = call.finish(result).await?;

        let mut state = self.state.write().await;
        state.products = products.clone();
        state.refilter();

        Ok(products)
    }

    pub async fn fetch_product(&self, product_id: &str) -> Result<Product, StoreError> {
        let op = CatalogOperation::FetchProduct;
        let call = self.operations.begin(op).await;

        let result = self.load_product(product_id).await;
        let product = call.finish(result).await?;

        self.state.write().await.selected = Some(product.clone());
        Ok(product)
    }

    pub async fn fetch_categories(&self) -> Result<Vec<String>, StoreError> {
        let op = CatalogOperation::FetchCategories;
        let call = self.operations.begin(op).await;

        let result = self.load_list("/categories", "categories").await;
        let categories: Vec<String> = call.finish(result).await?;

        self.state.write().await.categories = categories.clone();
        Ok(categories)
    }

    /// Restricts the view to one category; `"all"` lifts the restriction.
    pub async fn filter_by_category(&self, category: &str) -> Vec<Product> {
        let mut state = self.state.write().await;
        state.filters.category = category.to_string();
        state.refilter();
        state.filtered.clone()
    }

    /// Restricts the view to prices within `min..=max`.
    pub async fn filter_by_price(&self, min: f64, max: f64) -> Vec<Product> {
        let mut state = self.state.write().await;
        state.filters.price_range = PriceRange { min, max };
        state.refilter();
        state.filtered.clone()
    }

    pub async fn clear_filters(&self) -> Vec<Product> {
        let mut state = self.state.write().await;
        state.filters = ProductFilters {
            category: ALL_CATEGORIES.to_string(),
            price_range: PriceRange::default(),
        };
        state.refilter();
        state.filtered.clone()
    }

    pub async fn clear_selected(&self) {
        self.state.write().await.selected = None;
    }

    async fn load_list<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        key: &str,
    ) -> Result<Vec<T>, StoreError> {
        let body = self.api.send(Method::GET, path, None).await?;
        Ok(decode_list(body, key)?)
    }

    async fn load_product(&self, product_id: &str) -> Result<Product, StoreError> {
        let body = self
            .api
            .send(Method::GET, &format!("/products/{product_id}"), None)
            .await?;
        Ok(serde_json::from_value(unwrap_key(body, "product"))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockRemoteApi;
    use serde_json::json;

    fn catalog() -> serde_json::Value {
        json!({
            "success": true,
            "count": 3,
            "products": [
                { "id": "p1", "name": "Kettle", "price": 1200.0, "stock": 4, "category": "kitchen" },
                { "id": "p2", "name": "Mug", "price": 250.0, "stock": 40, "category": "kitchen" },
                { "id": "p3", "name": "Lamp", "price": 900.0, "stock": 0, "category": "lighting" }
            ]
        })
    }

    async fn loaded_store() -> CatalogStore {
        let mut api = MockRemoteApi::new();
        api.expect_send()
            .withf(|method, path, _| *method == Method::GET && path == "/products")
            .returning(|_, _, _| Ok(catalog()));

        let store = CatalogStore::new(Arc::new(api));
        store.fetch_products().await.unwrap();
        store
    }

    #[tokio::test]
    async fn unfiltered_view_matches_the_list() {
        let store = loaded_store().await;
        assert_eq!(store.filtered_products().await.len(), 3);
    }

    #[tokio::test]
    async fn category_and_price_filters_combine() {
        let store = loaded_store().await;

        let kitchen = store.filter_by_category("kitchen").await;
        assert_eq!(kitchen.len(), 2);

        let cheap_kitchen = store.filter_by_price(0.0, 250.0).await;
        assert_eq!(cheap_kitchen.len(), 1);
        assert_eq!(cheap_kitchen[0].id, "p2");

        let everything = store.clear_filters().await;
        assert_eq!(everything.len(), 3);
        assert_eq!(store.filters().await, ProductFilters::default());
    }

    #[tokio::test]
    async fn all_category_disables_category_filter() {
        let store = loaded_store().await;
        store.filter_by_category("lighting").await;
        assert_eq!(store.filter_by_category("all").await.len(), 3);
    }

    #[tokio::test]
    async fn product_detail_accepts_envelope() {
        let mut api = MockRemoteApi::new();
        api.expect_send()
            .withf(|_, path, _| path == "/products/p1")
            .returning(|_, _, _| {
                Ok(json!({ "product": { "id": "p1", "name": "Kettle", "price": 1200.0 } }))
            });

        let store = CatalogStore::new(Arc::new(api));
        let product = store.fetch_product("p1").await.unwrap();

        assert_eq!(product.name, "Kettle");
        assert_eq!(store.selected().await, Some(product));
    }

    #[tokio::test]
    async fn categories_accept_bare_array() {
        let mut api = MockRemoteApi::new();
        api.expect_send()
            .returning(|_, _, _| Ok(json!(["kitchen", "lighting"])));

        let store = CatalogStore::new(Arc::new(api));
        assert_eq!(store.fetch_categories().await.unwrap(), ["kitchen", "lighting"]);
    }
}
