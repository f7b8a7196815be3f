//! Admin product console.

use std::sync::Arc;

use reqwest::Method;
use tokio::sync::RwLock;
use tracing::info;

use super::helpers::RecordList;
use crate::{
    catalog::models::{Product, ProductInput},
    error::StoreError,
    tracker::{Operation, OperationStatus, OperationTracker},
    transport::{
        helpers::{decode_list, unwrap_key},
        RemoteApi,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdminProductOperation {
    FetchAll,
    Create,
    Update,
    Delete,
}

impl Operation for AdminProductOperation {
    fn fallback_message(self) -> &'static str {
        match self {
            Self::FetchAll => "Failed to fetch products",
            Self::Create => "Failed to add product",
            Self::Update => "Failed to update product",
            Self::Delete => "Failed to delete product",
        }
    }
}

/// Admin view of the catalog, including inactive products.
pub struct AdminProductStore {
    api: Arc<dyn RemoteApi>,
    products: RwLock<RecordList<Product>>,
    operations: OperationTracker<AdminProductOperation>,
}

impl std::fmt::Debug for AdminProductStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminProductStore")
            .field("products", &self.products)
            .finish_non_exhaustive()
    }
}

impl AdminProductStore {
    pub fn new(api: Arc<dyn RemoteApi>) -> Self {
        Self {
            api,
            products: RwLock::new(RecordList::default()),
            operations: OperationTracker::new(),
        }
    }

    pub async fn products(&self) -> Vec<Product> {
        self.products.read().await.items.clone()
    }

    pub async fn selected(&self) -> Option<Product> {
        self.products.read().await.selected.clone()
    }

    pub async fn select(&self, product_id: &str) -> bool {
        self.products.write().await.select(product_id)
    }

    pub async fn clear_selected(&self) {
        self.products.write().await.selected = None;
    }

    pub async fn error(&self) -> Option<String> {
        self.operations.error().await
    }

    pub async fn clear_error(&self) {
        self.operations.clear_error().await;
    }

    pub fn status(&self, op: AdminProductOperation) -> OperationStatus {
        self.operations.status(op)
    }

    pub fn is_loading(&self) -> bool {
        self.operations.is_loading()
    }

    pub async fn fetch_products(&self) -> Result<Vec<Product>, StoreError> {
        let op = AdminProductOperation::FetchAll;
        let call = self.operations.begin(op).await;

        let result = self.load_products().await;
        let products = call.finish(result).await?;

        self.products.write().await.items = products.clone();
        Ok(products)
    }

    pub async fn create_product(&self, input: &ProductInput) -> Result<Product, StoreError> {
        let op = AdminProductOperation::Create;
        let call = self.operations.begin(op).await;

        let result = self.submit(Method::POST, "/admin/products", input).await;
        let product = call.finish(result).await?;

        self.products.write().await.insert(product.clone());
        info!(product_id = %product.id, name = %product.name, "product created");
        Ok(product)
    }

    pub async fn update_product(&self, product_id: &str, input: &ProductInput) -> Result<Product, StoreError> {
        let op = AdminProductOperation::Update;
        let call = self.operations.begin(op).await;

        let path = format!("/admin/products/{product_id}");
        let result = self.submit(Method::PUT, &path, input).await;
        let product = call.finish(result).await?;

        self.products.write().await.replace(product.clone());
        Ok(product)
    }

    pub async fn delete_product(&self, product_id: &str) -> Result<(), StoreError> {
        let op = AdminProductOperation::Delete;
        let call = self.operations.begin(op).await;

        let result = self
            .api
            .send(Method::DELETE, &format!("/admin/products/{product_id}"), None)
            .await
            .map_err(StoreError::from);
        call.finish(result).await?;

        self.products.write().await.remove(product_id);
        info!(product_id, "product deleted");
        Ok(())
    }

    async fn load_products(&self) -> Result<Vec<Product>, StoreError> {
        let body = self.api.send(Method::GET, "/admin/products", None).await?;
        Ok(decode_list(body, "products")?)
    }

    async fn submit(&self, method: Method, path: &str, input: &ProductInput) -> Result<Product, StoreError> {
        let body = serde_json::to_value(input)?;
        let response = self.api.send(method, path, Some(body)).await?;
        Ok(serde_json::from_value(unwrap_key(response, "product"))?)
    }
}
