//! Admin order console: every customer's orders and status changes.

use std::sync::Arc;

use reqwest::Method;
use tokio::sync::RwLock;
use tracing::info;

use crate::{
    error::StoreError,
    orders::models::{Order, OrderStatus, StatusUpdateRequest},
    tracker::{Operation, OperationStatus, OperationTracker},
    transport::{helpers::decode_list, RemoteApi},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdminOrderOperation {
    FetchAll,
    UpdateStatus,
}

impl Operation for AdminOrderOperation {
    fn fallback_message(self) -> &'static str {
        match self {
            Self::FetchAll => "Failed to fetch orders",
            Self::UpdateStatus => "Failed to update order status",
        }
    }
}

pub struct AdminOrderStore {
    api: Arc<dyn RemoteApi>,
    orders: RwLock<Vec<Order>>,
    operations: OperationTracker<AdminOrderOperation>,
}

impl std::fmt::Debug for AdminOrderStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminOrderStore")
            .field("orders", &self.orders)
            .finish_non_exhaustive()
    }
}

impl AdminOrderStore {
    pub fn new(api: Arc<dyn RemoteApi>) -> Self {
        Self {
            api,
            orders: RwLock::new(Vec::new()),
            operations: OperationTracker::new(),
        }
    }

    pub async fn orders(&self) -> Vec<Order> {
        self.orders.read().await.clone()
    }

    pub async fn error(&self) -> Option<String> {
        self.operations.error().await
    }

    pub async fn clear_error(&self) {
        self.operations.clear_error().await;
    }

    pub fn status(&self, op: AdminOrderOperation) -> OperationStatus {
        self.operations.status(op)
    }

    pub fn is_loading(&self) -> bool {
        self.operations.is_loading()
    }

    pub async fn fetch_orders(&self) -> Result<Vec<Order>, StoreError> {
        let op = AdminOrderOperation::FetchAll;
        let call = self.operations.begin(op).await;

        let result = self.load_orders().await;
        let orders = call.finish(result).await?;

        *self.orders.write().await = orders.clone();
        Ok(orders)
    }

    /// Moves an order to `status`.
    ///
    /// The response body is ignored; on success the cached order's status
    /// is patched in place.
    pub async fn update_status(&self, order_id: &str, status: OrderStatus) -> Result<(), StoreError> {
        let op = AdminOrderOperation::UpdateStatus;
        let call = self.operations.begin(op).await;

        let result = self.send_status(order_id, status).await;
        call.finish(result).await?;

        let mut orders = self.orders.write().await;
        if let Some(order) = orders.iter_mut().find(|order| order.id == order_id) {
            order.status = status;
        }
        info!(order_id, %status, "order status updated");

        Ok(())
    }

    async fn load_orders(&self) -> Result<Vec<Order>, StoreError> {
        let body = self.api.send(Method::GET, "/admin/orders", None).await?;
        Ok(decode_list(body, "orders")?)
    }

    async fn send_status(&self, order_id: &str, status: OrderStatus) -> Result<(), StoreError> {
        let body = serde_json::to_value(StatusUpdateRequest { status })?;
        self.api
            .send(
                Method::PUT,
                &format!("/admin/orders/{order_id}/status"),
                Some(body),
            )
            .await?;
        Ok(())
    }
}
